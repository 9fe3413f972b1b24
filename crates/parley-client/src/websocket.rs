//! Websocket relay transport.
//!
//! Provides [`WsTransport`], which keeps one websocket to a relay node and
//! multiplexes every peer link over it. Each binary websocket message carries
//! one CBOR [`RelayFrame`]. A single connection task owns the socket; handles
//! talk to it through a command channel.

use std::{collections::HashMap, future::Future};

use futures::{SinkExt, StreamExt, stream::SplitSink};
use parley_proto::{ChatMessage, PeerAddress, Protocol, RelayFrame, codec};
use tokio::{
    net::TcpStream,
    sync::{mpsc, oneshot},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::transport::{MessageSink, MessageStream, PeerLink, Transport, TransportError};

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

type AddReply = oneshot::Sender<Result<mpsc::Receiver<ChatMessage>, TransportError>>;

/// Buffered messages per peer link before the connection task waits.
const LINK_CAPACITY: usize = 32;

enum Command {
    AddPeer {
        peer: PeerAddress,
        protocol: Protocol,
        reply: AddReply,
    },
    Send {
        peer: PeerAddress,
        message: ChatMessage,
        reply: oneshot::Sender<Result<(), TransportError>>,
    },
}

/// Handle to a relay connection.
pub struct WsTransport {
    commands: mpsc::Sender<Command>,
    abort_handle: tokio::task::AbortHandle,
}

impl WsTransport {
    /// Connect to the relay at `ws://host:port`.
    ///
    /// # Errors
    ///
    /// - `TransportError::Connection` if the websocket handshake fails
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let url = format!("ws://{host}:{port}");
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::Connection(format!("{url}: {e}")))?;
        tracing::info!(%url, "connected to relay");

        let (commands, rx) = mpsc::channel(64);
        let handle = tokio::spawn(run_connection(stream, rx));

        Ok(Self { commands, abort_handle: handle.abort_handle() })
    }

    /// Stop the connection task. Every open link closes.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Transport for WsTransport {
    type Sink = WsSink;
    type Stream = WsStream;

    async fn add_peer(
        &self,
        address: &PeerAddress,
        protocol: &Protocol,
    ) -> Result<PeerLink<Self::Sink, Self::Stream>, TransportError> {
        let (reply, response) = oneshot::channel();
        let command =
            Command::AddPeer { peer: address.clone(), protocol: protocol.clone(), reply };
        self.commands.send(command).await.map_err(|_| TransportError::Closed)?;
        let rx = response.await.map_err(|_| TransportError::Closed)??;

        Ok(PeerLink {
            sink: WsSink { peer: address.clone(), commands: self.commands.clone() },
            stream: WsStream { rx },
        })
    }
}

/// Outgoing half of a relay link.
pub struct WsSink {
    peer: PeerAddress,
    commands: mpsc::Sender<Command>,
}

impl MessageSink for WsSink {
    fn send(
        &mut self,
        message: &ChatMessage,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let (reply, response) = oneshot::channel();
        let command = Command::Send { peer: self.peer.clone(), message: message.clone(), reply };
        let commands = self.commands.clone();
        async move {
            if commands.send(command).await.is_err() {
                return Err(TransportError::Closed);
            }
            response.await.unwrap_or(Err(TransportError::Closed))
        }
    }
}

/// Incoming half of a relay link.
pub struct WsStream {
    rx: mpsc::Receiver<ChatMessage>,
}

impl MessageStream for WsStream {
    async fn recv(&mut self) -> Option<Result<ChatMessage, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}

/// Own the socket: write frames for handles, route frames from the relay.
async fn run_connection(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut commands: mpsc::Receiver<Command>,
) {
    let (mut writer, mut reader) = stream.split();
    let mut pending: HashMap<PeerAddress, AddReply> = HashMap::new();
    let mut links: HashMap<PeerAddress, mpsc::Sender<ChatMessage>> = HashMap::new();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::AddPeer { peer, protocol, reply }) => {
                    let frame = RelayFrame::AddPeer { peer: peer.clone(), protocol };
                    match write_frame(&mut writer, &frame).await {
                        Ok(()) => {
                            pending.insert(peer, reply);
                        },
                        Err(e) => {
                            let _ = reply.send(Err(e));
                        },
                    }
                },
                Some(Command::Send { peer, message, reply }) => {
                    let result = write_frame(&mut writer, &RelayFrame::Deliver { peer, message }).await;
                    let _ = reply.send(result);
                },
                None => break,
            },

            incoming = reader.next() => match incoming {
                Some(Ok(Message::Binary(bytes))) => match codec::decode::<RelayFrame>(&bytes) {
                    Ok(frame) => route(frame, &mut pending, &mut links).await,
                    Err(e) => tracing::warn!(error = %e, "dropping malformed relay frame"),
                },
                Some(Ok(Message::Ping(payload))) => {
                    if let Err(e) = writer.send(Message::Pong(payload)).await {
                        tracing::warn!(error = %e, "relay pong failed");
                        break;
                    }
                },
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(?frame, "relay closed connection");
                    break;
                },
                Some(Ok(_)) => {},
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "relay read failed");
                    break;
                },
                None => break,
            },
        }
    }

    for (peer, reply) in pending.drain() {
        let _ = reply.send(Err(TransportError::Unreachable {
            peer,
            reason: "relay connection closed".to_string(),
        }));
    }
    tracing::info!(links = links.len(), "relay connection finished");
}

/// Apply one frame from the relay.
async fn route(
    frame: RelayFrame,
    pending: &mut HashMap<PeerAddress, AddReply>,
    links: &mut HashMap<PeerAddress, mpsc::Sender<ChatMessage>>,
) {
    match frame {
        RelayFrame::PeerAccepted { peer } => {
            if let Some(reply) = pending.remove(&peer) {
                let (tx, rx) = mpsc::channel(LINK_CAPACITY);
                links.insert(peer, tx);
                let _ = reply.send(Ok(rx));
            }
        },
        RelayFrame::PeerRejected { peer, reason } => {
            if let Some(reply) = pending.remove(&peer) {
                let _ = reply.send(Err(TransportError::Unreachable { peer, reason }));
            }
        },
        RelayFrame::Deliver { peer, message } => {
            let open = match links.get(&peer) {
                Some(tx) => tx.send(message).await.is_ok(),
                None => {
                    tracing::debug!(peer = %peer, "message for unknown link");
                    true
                },
            };
            if !open {
                links.remove(&peer);
            }
        },
        RelayFrame::PeerClosed { peer } => {
            links.remove(&peer);
            tracing::info!(peer = %peer, "relay closed link");
        },
        RelayFrame::AddPeer { peer, .. } => {
            tracing::warn!(peer = %peer, "unexpected add request from relay");
        },
    }
}

async fn write_frame(writer: &mut WsWriter, frame: &RelayFrame) -> Result<(), TransportError> {
    let bytes = codec::encode(frame)?;
    writer.send(Message::Binary(bytes)).await.map_err(|e| TransportError::Stream(e.to_string()))
}
