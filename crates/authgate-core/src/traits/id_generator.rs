//! Identifier generation for sessions and token JTIs.

use uuid::Uuid;

/// Produces globally unique, lexicographically sortable identifiers.
pub trait IdGenerator: Send + Sync + std::fmt::Debug + 'static {
    /// Return a fresh identifier. Never returns the same value twice.
    fn next_id(&self) -> String;
}

/// UUIDv7 generator. The leading 48 bits are a millisecond timestamp, so
/// the hyphenated form sorts by creation time.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidV7Generator;

impl IdGenerator for UuidV7Generator {
    fn next_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
