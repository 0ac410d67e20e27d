//! Permission value objects.

pub mod model;

pub use model::{FULL_ACCESS, Permission, known};
