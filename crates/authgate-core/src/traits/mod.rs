//! Core traits defined in `authgate-core` and implemented by other crates.

pub mod cache;
pub mod id_generator;

pub use cache::CacheProvider;
pub use id_generator::{IdGenerator, UuidV7Generator};
