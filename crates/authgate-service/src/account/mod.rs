//! Self-service account use cases.

pub mod service;

pub use service::{AccountService, ChangePasswordInput, RegisterInput};
