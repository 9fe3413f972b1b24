//! CBOR codec.
//!
//! Every value that crosses a transport is CBOR-encoded. [`encode`] and
//! [`decode`] work on any serde type; the message helpers exist so callers do
//! not need to name the generic form.

use serde::{Serialize, de::DeserializeOwned};

use crate::{
    ChatMessage,
    errors::{ProtocolError, Result},
};

/// Encode a value as CBOR.
///
/// # Errors
///
/// - `ProtocolError::CborEncode` if serialization fails
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
    Ok(buf)
}

/// Decode a CBOR value.
///
/// # Errors
///
/// - `ProtocolError::CborDecode` if the bytes are not a valid encoding of `T`
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))
}

/// Serialize a chat message into its wire form.
pub fn encode_message(message: &ChatMessage) -> Result<Vec<u8>> {
    encode(message)
}

/// Deserialize a chat message from its wire form.
pub fn decode_message(bytes: &[u8]) -> Result<ChatMessage> {
    decode(bytes)
}
