//! Error types for wire encoding and decoding.

use thiserror::Error;

/// Errors raised while encoding or decoding names and packets.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("TLV block is truncated")]
    Truncated,

    #[error("non-minimal variable-size number encoding")]
    NonMinimalNumber,

    #[error("unexpected TLV type {found}, expected {expected}")]
    UnexpectedType { expected: u64, found: u64 },

    #[error("zero is not a valid name component type")]
    ZeroComponentType,

    #[error("name component type {0} does not fit in 16 bits")]
    ComponentTypeRange(u64),

    #[error("nonNegativeInteger field has invalid length {0}")]
    InvalidIntegerLength(usize),

    #[error("invalid name URI: {reason}")]
    InvalidUri { reason: String },
}
