//! Credential use cases.

pub mod service;

pub use service::{AuthService, AuthTokens, LoginInput, Profile, RefreshInput};
