//! Peer addresses.
//!
//! A [`PeerAddress`] is the opaque byte identity the transport uses to reach a
//! participant. Users type it as hex; it is displayed the same way.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// Transport-level address of a remote peer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerAddress(Vec<u8>);

impl PeerAddress {
    /// Largest address accepted, in bytes.
    pub const MAX_LEN: usize = 32;

    /// Build an address from raw bytes.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::AddressLength` if `bytes` is empty or longer than
    ///   [`Self::MAX_LEN`]
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() || bytes.len() > Self::MAX_LEN {
            return Err(ProtocolError::AddressLength { len: bytes.len(), max: Self::MAX_LEN });
        }
        Ok(Self(bytes))
    }

    /// Parse a hex string, with or without a leading `0x`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::InvalidHex` if the text is not an even-length hex
    ///   string
    /// - `ProtocolError::AddressLength` if the decoded bytes are out of range
    pub fn from_hex(text: &str) -> Result<Self> {
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        let bytes = hex::decode(digits).map_err(|e| ProtocolError::InvalidHex(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Full lowercase hex form.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// First eight hex digits, used as the default nickname.
    pub fn short(&self) -> String {
        let mut digits = self.to_hex();
        digits.truncate(8);
        digits
    }
}

impl fmt::Display for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for PeerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerAddress({})", self.to_hex())
    }
}
