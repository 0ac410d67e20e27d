//! Session persistence and lifecycle.
//!
//! A session is three pieces of state kept consistent by the store: the
//! session record, a pointer from the current refresh JTI to that record,
//! and the owning user's index of session keys. [`SessionManager`] builds
//! records and TTLs on top of a [`SessionStore`]; [`SessionSweeper`]
//! prunes index entries whose records have expired.

pub mod manager;
pub mod memory;
#[cfg(feature = "redis-store")]
pub mod redis;
pub mod store;
pub mod sweeper;

pub use manager::{NewSession, SessionDeletion, SessionManager, SessionRotation};
pub use memory::MemorySessionStore;
#[cfg(feature = "redis-store")]
pub use redis::RedisSessionStore;
pub use store::{JtiRotation, SessionStore};
pub use sweeper::SessionSweeper;
