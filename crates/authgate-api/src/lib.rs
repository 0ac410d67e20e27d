//! # authgate-api
//!
//! HTTP API layer for AuthGate built on Axum.
//!
//! Provides the auth, session, admin, and health endpoints, the bearer
//! token extractor, request validation, and the mapping from [`AppError`]
//! kinds to status codes.
//!
//! [`AppError`]: authgate_core::error::AppError

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
