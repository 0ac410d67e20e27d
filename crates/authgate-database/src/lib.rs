//! # authgate-database
//!
//! PostgreSQL connection management, the repository traits consumed by
//! the authorization cache and use cases, and their sqlx implementations.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
