//! # authgate-auth
//!
//! Credential and session lifecycle for AuthGate.
//!
//! ## Modules
//!
//! - `jwt`: access/refresh token issuance and validation
//! - `session`: the session store (Redis Lua scripts or in-memory), the
//!   lifecycle service on top of it, and the index sweeper
//! - `authz`: read-through caches for user facts and role permissions,
//!   the authorizer, and the invalidation handlers that evict them
//! - `password`: Argon2id password hashing and the strength policy for
//!   new passwords

pub mod authz;
pub mod jwt;
pub mod password;
pub mod session;

pub use authz::{AuthzCache, Authorizer};
pub use jwt::{Claims, TokenCodec, TokenType};
pub use password::{PasswordHasher, PasswordPolicy};
pub use session::{SessionManager, SessionStore, SessionSweeper};
