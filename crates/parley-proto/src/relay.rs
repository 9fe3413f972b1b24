//! Relay envelope.
//!
//! A single websocket to a relay node carries traffic for every peer. Each
//! binary websocket message holds one CBOR-encoded [`RelayFrame`]; the `peer`
//! field says which peer link the frame belongs to.

use serde::{Deserialize, Serialize};

use crate::{ChatMessage, PeerAddress, Protocol};

/// One frame on the relay websocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayFrame {
    /// Client asks the node to open a link to `peer`.
    AddPeer {
        /// Peer to link with.
        peer: PeerAddress,
        /// Protocol the link will speak.
        protocol: Protocol,
    },

    /// Node accepted an [`RelayFrame::AddPeer`] request.
    PeerAccepted {
        /// Linked peer.
        peer: PeerAddress,
    },

    /// Node refused an [`RelayFrame::AddPeer`] request.
    PeerRejected {
        /// Peer that could not be linked.
        peer: PeerAddress,
        /// Human-readable reason.
        reason: String,
    },

    /// A chat message travelling to (client to node) or from (node to
    /// client) `peer`.
    Deliver {
        /// Remote end of the link.
        peer: PeerAddress,
        /// Message carried.
        message: ChatMessage,
    },

    /// Node closed the link to `peer`.
    PeerClosed {
        /// Peer whose link closed.
        peer: PeerAddress,
    },
}
