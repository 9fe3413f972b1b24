//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while parsing addresses or (de)serializing wire values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// CBOR serialization failed.
    #[error("CBOR encode failed: {0}")]
    CborEncode(String),

    /// CBOR deserialization failed.
    #[error("CBOR decode failed: {0}")]
    CborDecode(String),

    /// Address text is not valid hex.
    #[error("invalid hex address: {0}")]
    InvalidHex(String),

    /// Decoded address has an unsupported length.
    #[error("address must be 1 to {max} bytes, got {len}")]
    AddressLength {
        /// Decoded length in bytes.
        len: usize,
        /// Largest accepted length in bytes.
        max: usize,
    },
}
