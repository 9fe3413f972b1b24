//! Events delivered to the remote conversation owner.

use parley_proto::{ChatMessage, PeerAddress};

/// Everything that can land in the remote viewport.
///
/// Peer receive handlers, the router, and the input loop all write into the
/// same channel so that a single task owns the remote buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A chat message arrived on the link to `from`.
    Message {
        /// Link the message arrived on.
        from: PeerAddress,
        /// Decoded message.
        message: ChatMessage,
    },

    /// A peer link is up; `nick` labels its messages from now on.
    PeerUp {
        /// Linked peer.
        address: PeerAddress,
        /// Display nickname.
        nick: String,
    },

    /// A system line (command results and user-facing errors).
    Notice(String),
}
