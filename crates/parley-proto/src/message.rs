//! Chat message payload.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A single line of conversation.
///
/// Immutable once built. `serial` is the sender's local entry count at send
/// time; every participant numbers independently, so it is never used to
/// order or deduplicate messages from different peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    serial: u64,
    #[serde(with = "serde_bytes")]
    content: Vec<u8>,
    source: String,
}

impl ChatMessage {
    /// Build a message.
    pub fn new(serial: u64, content: impl Into<Vec<u8>>, source: impl Into<String>) -> Self {
        Self { serial, content: content.into(), source: source.into() }
    }

    /// Sender-local sequence number.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Opaque message body.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Body decoded as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Source identifier chosen by the sender.
    pub fn source(&self) -> &str {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_lossy() {
        let message = ChatMessage::new(0, vec![b'h', 0xff, b'i'], "self");
        assert_eq!(message.text(), "h\u{fffd}i");
    }

    #[test]
    fn content_is_a_cbor_byte_string() {
        let message = ChatMessage::new(1, vec![0xde, 0xad], "self");
        let bytes = crate::codec::encode_message(&message).unwrap();
        let value: ciborium::Value = crate::codec::decode(&bytes).unwrap();

        let content = value
            .as_map()
            .and_then(|fields| fields.iter().find(|(key, _)| key.as_text() == Some("content")))
            .map(|(_, content)| content.clone());
        assert_eq!(content, Some(ciborium::Value::Bytes(vec![0xde, 0xad])));
    }

    #[test]
    fn accessors() {
        let message = ChatMessage::new(3, "hi", "self");
        assert_eq!(message.serial(), 3);
        assert_eq!(message.content(), b"hi");
        assert_eq!(message.source(), "self");
    }
}
