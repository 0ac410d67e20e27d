//! Administrative writes that make cached authorization facts stale.
//!
//! Every write commits to the repository first, evicts the affected cache
//! entry inline (best-effort), and then publishes an invalidation event so
//! every other registered handler catches up in the background.

pub mod role;
pub mod user;

pub use role::RoleAdminService;
pub use user::{CreateUserInput, UserAdminService};
