//! # authgate-service
//!
//! Use cases built on the auth crate. Each service takes its collaborators
//! as `Arc`s at construction time and is cheap to clone.

pub mod account;
pub mod admin;
pub mod auth;
pub mod context;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use account::{AccountService, ChangePasswordInput, RegisterInput};
pub use admin::{CreateUserInput, RoleAdminService, UserAdminService};
pub use auth::{AuthService, AuthTokens, LoginInput, Profile, RefreshInput};
pub use context::AuthContext;
pub use session::{RevokeSessions, SessionService};
