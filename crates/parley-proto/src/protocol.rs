//! Protocol descriptor.

use serde::{Deserialize, Serialize};

/// Names the application protocol a peer link speaks.
///
/// Passed to the transport when a peer is added so the remote side can route
/// frames to the right handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Protocol {
    /// Protocol name.
    pub name: String,
    /// Protocol version.
    pub version: u32,
}

impl Protocol {
    /// Name of the chat protocol.
    pub const CHAT_NAME: &'static str = "chat";

    /// Current chat protocol version.
    pub const CHAT_VERSION: u32 = 1;

    /// Descriptor for the chat protocol.
    pub fn chat() -> Self {
        Self { name: Self::CHAT_NAME.to_string(), version: Self::CHAT_VERSION }
    }
}

impl Default for Protocol {
    fn default() -> Self {
        Self::chat()
    }
}
