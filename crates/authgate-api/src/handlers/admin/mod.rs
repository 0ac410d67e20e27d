//! Administrator handlers.

pub mod roles;
pub mod users;
