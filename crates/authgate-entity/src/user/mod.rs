//! User domain entities.

pub mod facts;
pub mod model;
pub mod role;
pub mod status;

pub use facts::UserFacts;
pub use model::{CreateUser, User, UserFilter};
pub use role::UserRole;
pub use status::UserStatus;
