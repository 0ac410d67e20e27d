//! # authgate-entity
//!
//! Domain entity models for AuthGate. Database rows derive
//! `sqlx::FromRow`; session records live in Redis and are described by
//! [`session::Session`].

pub mod permission;
pub mod session;
pub mod user;
