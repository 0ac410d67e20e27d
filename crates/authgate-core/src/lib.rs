//! # authgate-core
//!
//! Core crate for AuthGate. Contains the unified error system,
//! configuration schemas, typed identifiers, cache and id-generation
//! traits, and the cache invalidation event bus.
//!
//! This crate has **no** internal dependencies on other AuthGate crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
