//! Transport seam.
//!
//! The router never touches sockets or wire bytes. A [`Transport`] opens a
//! link to a peer and hands back a [`MessageSink`] / [`MessageStream`] pair
//! that already speak [`ChatMessage`]; serialization happens behind them.

use std::future::Future;

use parley_proto::{ChatMessage, PeerAddress, Protocol, ProtocolError};
use thiserror::Error;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the transport endpoint failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport could not open a link to the peer.
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable {
        /// Requested peer.
        peer: PeerAddress,
        /// Reason reported by the transport.
        reason: String,
    },

    /// The link is gone.
    #[error("link closed")]
    Closed,

    /// Stream error.
    #[error("stream error: {0}")]
    Stream(String),

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Both halves of an open peer link.
#[derive(Debug)]
pub struct PeerLink<S, R> {
    /// Outgoing half.
    pub sink: S,
    /// Incoming half.
    pub stream: R,
}

/// Outgoing half of a peer link.
pub trait MessageSink: Send + 'static {
    /// Serialize and send one message to the peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the link is closed or the write fails. The caller
    /// treats any error as fatal for this link.
    fn send(
        &mut self,
        message: &ChatMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Incoming half of a peer link.
pub trait MessageStream: Send + 'static {
    /// Next message from the peer.
    ///
    /// Returns `None` once the link is closed. A frame that fails to
    /// deserialize yields `Some(Err(_))` and the stream stays usable.
    fn recv(&mut self) -> impl Future<Output = Option<Result<ChatMessage, TransportError>>> + Send;
}

/// Opens peer links.
///
/// # Implementations
///
/// - **Websocket**: one relay connection multiplexing every peer
/// - **Memory**: in-process channels, for simulation and tests
pub trait Transport: Send + Sync + 'static {
    /// Outgoing half produced by [`Transport::add_peer`].
    type Sink: MessageSink;

    /// Incoming half produced by [`Transport::add_peer`].
    type Stream: MessageStream;

    /// Open a link to `address` speaking `protocol`.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be established. Nothing is queued
    /// for a later retry.
    fn add_peer(
        &self,
        address: &PeerAddress,
        protocol: &Protocol,
    ) -> impl Future<Output = Result<PeerLink<Self::Sink, Self::Stream>, TransportError>> + Send;
}
