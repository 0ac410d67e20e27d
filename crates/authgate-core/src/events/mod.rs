//! Cache invalidation events and the in-process bus that fans them out.
//!
//! Writers publish an [`InvalidationEvent`] after committing a change to a
//! user or role; handlers registered on the [`InvalidationBus`] evict the
//! affected cache entries in the background.

pub mod bus;
pub mod invalidation;

pub use bus::{InvalidationBus, InvalidationBusBuilder, InvalidationHandler};
pub use invalidation::{EventKind, InvalidationEvent};
