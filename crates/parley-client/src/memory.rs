//! In-process transport.
//!
//! Peers are registered up front with [`MemoryTransport::register`], which
//! returns the far end of the link as a [`RemotePeer`]. Every message that
//! crosses a link is CBOR-encoded on one side and decoded on the other, so the
//! wire codec is exercised exactly as with a real transport.

use std::{
    collections::HashMap,
    future::{self, Future},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use parley_proto::{ChatMessage, PeerAddress, Protocol, decode_message, encode_message};
use tokio::sync::mpsc;

use crate::transport::{MessageSink, MessageStream, PeerLink, Transport, TransportError};

struct PendingLink {
    to_peer: mpsc::UnboundedSender<Vec<u8>>,
    from_peer: mpsc::UnboundedReceiver<Vec<u8>>,
    alive: mpsc::UnboundedSender<()>,
}

#[derive(Default)]
struct Inner {
    links: HashMap<PeerAddress, PendingLink>,
    calls: Vec<PeerAddress>,
}

/// Transport backed by in-process channels.
///
/// Cheap to clone; clones share the same registry, so a test can keep a handle
/// after moving the transport into a router.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTransport {
    /// Create a transport with no reachable peers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `address` reachable and return its far end.
    ///
    /// Registering an address again replaces any link not yet claimed by
    /// [`Transport::add_peer`].
    pub fn register(&self, address: PeerAddress) -> RemotePeer {
        let (to_peer, sent) = mpsc::unbounded_channel();
        let (deliver, from_peer) = mpsc::unbounded_channel();
        let (alive, sink_alive) = mpsc::unbounded_channel();
        self.lock().links.insert(address.clone(), PendingLink { to_peer, from_peer, alive });
        RemotePeer { address, sent, sink_alive, delivery: Delivery { tx: deliver } }
    }

    /// Every address passed to [`Transport::add_peer`], in call order.
    pub fn add_peer_calls(&self) -> Vec<PeerAddress> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn claim(&self, address: &PeerAddress) -> Result<PeerLink<MemorySink, MemoryStream>, TransportError> {
        let mut inner = self.lock();
        inner.calls.push(address.clone());
        let link = inner.links.remove(address).ok_or_else(|| TransportError::Unreachable {
            peer: address.clone(),
            reason: "no route to peer".to_string(),
        })?;
        Ok(PeerLink {
            sink: MemorySink { tx: link.to_peer, _alive: link.alive },
            stream: MemoryStream { rx: link.from_peer },
        })
    }
}

impl Transport for MemoryTransport {
    type Sink = MemorySink;
    type Stream = MemoryStream;

    fn add_peer(
        &self,
        address: &PeerAddress,
        _protocol: &Protocol,
    ) -> impl Future<Output = Result<PeerLink<Self::Sink, Self::Stream>, TransportError>> + Send
    {
        future::ready(self.claim(address))
    }
}

/// Outgoing half of an in-process link.
#[derive(Debug)]
pub struct MemorySink {
    tx: mpsc::UnboundedSender<Vec<u8>>,
    /// Never written; its receiver sees the channel close when the sink drops.
    _alive: mpsc::UnboundedSender<()>,
}

impl MessageSink for MemorySink {
    fn send(
        &mut self,
        message: &ChatMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let result = encode_message(message)
            .map_err(TransportError::from)
            .and_then(|bytes| self.tx.send(bytes).map_err(|_| TransportError::Closed));
        future::ready(result)
    }
}

/// Incoming half of an in-process link.
#[derive(Debug)]
pub struct MemoryStream {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MessageStream for MemoryStream {
    async fn recv(&mut self) -> Option<Result<ChatMessage, TransportError>> {
        let bytes = self.rx.recv().await?;
        Some(decode_message(&bytes).map_err(TransportError::from))
    }
}

/// Cloneable handle for pushing messages from a remote peer.
#[derive(Debug, Clone)]
pub struct Delivery {
    tx: mpsc::UnboundedSender<Vec<u8>>,
}

impl Delivery {
    /// Send `message` to the local side, as the remote peer.
    pub fn deliver(&self, message: &ChatMessage) -> Result<(), TransportError> {
        let bytes = encode_message(message)?;
        self.deliver_raw(bytes)
    }

    /// Send raw wire bytes to the local side.
    pub fn deliver_raw(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.tx.send(bytes).map_err(|_| TransportError::Closed)
    }
}

/// The far end of an in-process link.
///
/// Dropping it (and every [`Delivery`] clone) closes the local stream.
#[derive(Debug)]
pub struct RemotePeer {
    address: PeerAddress,
    sent: mpsc::UnboundedReceiver<Vec<u8>>,
    sink_alive: mpsc::UnboundedReceiver<()>,
    delivery: Delivery,
}

impl RemotePeer {
    /// Address this peer was registered under.
    pub fn address(&self) -> &PeerAddress {
        &self.address
    }

    /// Handle that can deliver messages from other tasks.
    pub fn delivery(&self) -> Delivery {
        self.delivery.clone()
    }

    /// Send `message` to the local side.
    pub fn deliver(&self, message: &ChatMessage) -> Result<(), TransportError> {
        self.delivery.deliver(message)
    }

    /// Send raw wire bytes to the local side.
    pub fn deliver_raw(&self, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.delivery.deliver_raw(bytes)
    }

    /// Next message the local side sent to this peer.
    ///
    /// Returns `None` once the local sink is gone, or after [`Self::hang_up`]
    /// once the messages accepted before it are read.
    pub async fn next_sent(&mut self) -> Option<ChatMessage> {
        let bytes = self.sent.recv().await?;
        decode_message(&bytes).ok()
    }

    /// Message already sent by the local side, without waiting.
    pub fn try_next_sent(&mut self) -> Option<ChatMessage> {
        let bytes = self.sent.try_recv().ok()?;
        decode_message(&bytes).ok()
    }

    /// Stop accepting messages; later sends on this link fail.
    pub fn hang_up(&mut self) {
        self.sent.close();
    }

    /// Wait until the local side has dropped its sink.
    pub async fn sink_dropped(&mut self) {
        while self.sink_alive.recv().await.is_some() {}
    }
}
