//! Message router.
//!
//! Each peer goes through `Connecting -> Running -> Closed`. While running,
//! two tasks serve the link:
//!
//! - a send worker draining its own outgoing queue, which writes every
//!   broadcast message to its peer and exits on the first send error
//! - a receive handler that forwards every decoded message into the inbound
//!   channel, tagged with the link it arrived on
//!
//! A failing peer only takes down its own tasks. When the send worker exits,
//! the receive handler for the same link is told to stop as well, and the
//! router reports the peer through [`Router::next_dropped`].

use std::collections::HashMap;

use parley_proto::{ChatMessage, PeerAddress, Protocol};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};

use crate::{
    Inbound,
    transport::{MessageSink, MessageStream, Transport, TransportError},
};

/// Router errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The peer already has a live link.
    #[error("peer {0} already connected")]
    AlreadyConnected(PeerAddress),

    /// The transport refused or failed to open the link.
    #[error("could not add peer {peer}: {source}")]
    AddPeer {
        /// Requested peer.
        peer: PeerAddress,
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },

    /// Nobody is consuming inbound events any more.
    #[error("inbound channel closed")]
    InboundClosed,
}

/// Lifecycle of one peer link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// The transport is opening the link.
    Connecting,
    /// Send worker and receive handler are running.
    Running,
    /// The send worker has exited; the peer no longer receives broadcasts.
    Closed,
}

/// Identifies one link to a peer, so a report from a dropped link never
/// touches a newer link to the same address.
type LinkId = u64;

enum PeerEntry {
    Connecting,
    Running {
        link: LinkId,
        queue: mpsc::UnboundedSender<ChatMessage>,
        worker: JoinHandle<()>,
        receiver: JoinHandle<()>,
    },
}

impl PeerEntry {
    fn state(&self) -> PeerState {
        match self {
            Self::Connecting => PeerState::Connecting,
            Self::Running { queue, worker, .. } if queue.is_closed() || worker.is_finished() => {
                PeerState::Closed
            },
            Self::Running { .. } => PeerState::Running,
        }
    }
}

/// Routes chat messages between the local user and every linked peer.
///
/// Owned by the input loop. Outgoing traffic is broadcast: every message
/// passed to [`Router::broadcast`] is queued for every running peer. Each
/// send worker has an unbounded queue of its own, so a stalled peer holds up
/// only itself and never loses a message while its link is alive.
pub struct Router<T: Transport> {
    transport: T,
    protocol: Protocol,
    inbound: mpsc::Sender<Inbound>,
    peers: HashMap<PeerAddress, PeerEntry>,
    next_link: LinkId,
    dropped_tx: mpsc::UnboundedSender<(PeerAddress, LinkId)>,
    dropped_rx: mpsc::UnboundedReceiver<(PeerAddress, LinkId)>,
}

impl<T: Transport> Router<T> {
    /// Create a router over `transport`.
    pub fn new(transport: T, inbound: mpsc::Sender<Inbound>) -> Self {
        let (dropped_tx, dropped_rx) = mpsc::unbounded_channel();
        Self {
            transport,
            protocol: Protocol::chat(),
            inbound,
            peers: HashMap::new(),
            next_link: 0,
            dropped_tx,
            dropped_rx,
        }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Open a link to `address` and start serving it.
    ///
    /// `nick` is announced on the inbound channel before any message from the
    /// peer can arrive, so the remote view can label the peer's traffic.
    ///
    /// # Errors
    ///
    /// - `RouterError::AlreadyConnected` if the peer has a live link
    /// - `RouterError::AddPeer` if the transport fails; reported here and not
    ///   retried
    /// - `RouterError::InboundClosed` if the inbound consumer is gone
    pub async fn add_peer(&mut self, address: PeerAddress, nick: String) -> Result<(), RouterError> {
        match self.peer_state(&address) {
            Some(PeerState::Connecting | PeerState::Running) => {
                return Err(RouterError::AlreadyConnected(address));
            },
            Some(PeerState::Closed) => self.forget(&address),
            None => {},
        }

        tracing::info!(peer = %address, "connecting to peer");
        self.peers.insert(address.clone(), PeerEntry::Connecting);

        let link = match self.transport.add_peer(&address, &self.protocol).await {
            Ok(link) => link,
            Err(source) => {
                self.peers.remove(&address);
                tracing::warn!(peer = %address, error = %source, "could not add peer");
                return Err(RouterError::AddPeer { peer: address, source });
            },
        };

        let announce = Inbound::PeerUp { address: address.clone(), nick };
        if self.inbound.send(announce).await.is_err() {
            self.peers.remove(&address);
            return Err(RouterError::InboundClosed);
        }

        let id = self.next_link;
        self.next_link += 1;

        let (queue, outgoing) = mpsc::unbounded_channel();
        let (hangup_tx, hangup_rx) = oneshot::channel();
        let worker = tokio::spawn(send_worker(
            address.clone(),
            link.sink,
            outgoing,
            hangup_tx,
            Dropped { link: id, report: self.dropped_tx.clone() },
        ));
        let receiver = tokio::spawn(receive_handler(
            address.clone(),
            link.stream,
            self.inbound.clone(),
            hangup_rx,
        ));

        tracing::info!(peer = %address, "peer running");
        self.peers.insert(address, PeerEntry::Running { link: id, queue, worker, receiver });
        Ok(())
    }

    /// Queue `message` for every running peer.
    ///
    /// Returns the number of send workers that will see it. Zero means no
    /// peer is linked and the message went nowhere.
    pub fn broadcast(&self, message: ChatMessage) -> usize {
        let mut workers = 0;
        for entry in self.peers.values() {
            if let PeerEntry::Running { queue, .. } = entry
                && queue.send(message.clone()).is_ok()
            {
                workers += 1;
            }
        }
        if workers == 0 {
            tracing::debug!("no running peers, message not routed");
        }
        workers
    }

    /// Wait for the next peer whose send worker failed.
    ///
    /// The peer is forgotten before it is returned, so it can be added again.
    /// Cancel safe: a report is either fully applied or left queued.
    pub async fn next_dropped(&mut self) -> Option<PeerAddress> {
        loop {
            let (address, link) = self.dropped_rx.recv().await?;
            let current = matches!(
                self.peers.get(&address),
                Some(PeerEntry::Running { link: running, .. }) if *running == link
            );
            if current {
                self.forget(&address);
                return Some(address);
            }
        }
    }

    /// Current state of the link to `address`, if one was ever opened.
    pub fn peer_state(&self, address: &PeerAddress) -> Option<PeerState> {
        self.peers.get(address).map(PeerEntry::state)
    }

    /// Number of peers currently in [`PeerState::Running`].
    pub fn running_peers(&self) -> usize {
        self.peers.values().filter(|entry| entry.state() == PeerState::Running).count()
    }

    fn forget(&mut self, address: &PeerAddress) {
        if let Some(PeerEntry::Running { receiver, .. }) = self.peers.remove(address) {
            receiver.abort();
        }
    }
}

/// How a send worker reports its own failure to the router.
struct Dropped {
    link: LinkId,
    report: mpsc::UnboundedSender<(PeerAddress, LinkId)>,
}

/// Drain one peer's outgoing queue into its sink.
///
/// Dropping `_hangup` on exit stops the matching receive handler. Only a send
/// failure is reported; a closed queue means the router let go of the peer.
async fn send_worker<S: MessageSink>(
    peer: PeerAddress,
    mut sink: S,
    mut outgoing: mpsc::UnboundedReceiver<ChatMessage>,
    _hangup: oneshot::Sender<()>,
    dropped: Dropped,
) {
    while let Some(message) = outgoing.recv().await {
        if let Err(e) = sink.send(&message).await {
            tracing::error!(peer = %peer, error = %e, "send failed, dropping peer");
            outgoing.close();
            let _ = dropped.report.send((peer.clone(), dropped.link));
            break;
        }
    }
    tracing::debug!(peer = %peer, "send worker stopped");
}

/// Forward one peer's messages into the inbound channel.
///
/// Frames already queued on the stream are forwarded before a hangup is
/// honoured.
async fn receive_handler<R: MessageStream>(
    peer: PeerAddress,
    mut stream: R,
    inbound: mpsc::Sender<Inbound>,
    mut hangup: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;

            next = stream.recv() => match next {
                Some(Ok(message)) => {
                    let event = Inbound::Message { from: peer.clone(), message };
                    if inbound.send(event).await.is_err() {
                        break;
                    }
                },
                Some(Err(e)) => {
                    tracing::warn!(peer = %peer, error = %e, "dropping undecodable frame");
                },
                None => break,
            },
            _ = &mut hangup => break,
        }
    }
    tracing::debug!(peer = %peer, "receive handler stopped");
}
