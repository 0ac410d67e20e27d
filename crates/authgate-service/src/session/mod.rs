//! Session listing and revocation for the session owner.

pub mod service;

pub use service::{RevokeSessions, SessionService};
