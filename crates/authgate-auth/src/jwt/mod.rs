//! JWT access and refresh tokens.
//!
//! [`TokenCodec`] is split across `encoder` (issuance) and `decoder`
//! (verification); it holds no mutable state and is safe to share.

pub mod claims;
pub mod codec;
pub mod decoder;
pub mod encoder;

pub use claims::{AUDIENCE, Claims, ISSUER, TokenType};
pub use codec::TokenCodec;
