//! Peer transport and message routing for parley
//!
//! The [`Router`] owns every peer link. Outgoing chat messages are broadcast
//! to one send worker per peer; inbound messages from every peer are funneled
//! into a single [`Inbound`] channel consumed by whoever owns the remote
//! conversation buffer.
//!
//! The transport itself is a seam ([`Transport`]). Two implementations ship
//! with the crate:
//!
//! - [`memory::MemoryTransport`]: in-process links, used for simulation and
//!   tests
//! - `websocket::WsTransport` (feature `websocket`): a relay node reached over
//!   one websocket

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod memory;
pub mod transport;
#[cfg(feature = "websocket")]
pub mod websocket;

mod inbound;
mod router;

pub use inbound::Inbound;
pub use router::{PeerState, Router, RouterError};
pub use transport::{MessageSink, MessageStream, PeerLink, Transport, TransportError};
