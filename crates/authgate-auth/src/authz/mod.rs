//! Authorization: cached user facts and role permissions, the checks
//! built on them, and the bus handlers that keep the caches honest.

pub mod authorizer;
pub mod cache;
pub mod invalidation;

pub use authorizer::Authorizer;
pub use cache::AuthzCache;
pub use invalidation::{RolePermissionsInvalidator, SessionRevoker, UserFactsInvalidator, register_handlers};
