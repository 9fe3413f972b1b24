//! Wire protocol for parley
//!
//! Types that cross the transport boundary and the CBOR codec that moves them
//! in and out of byte form. Nothing here performs I/O.
//!
//! # Components
//!
//! - [`ChatMessage`]: the unit of conversation exchanged between peers
//! - [`PeerAddress`]: transport-level identity of a remote participant
//! - [`Protocol`]: descriptor handed to the transport when a peer is added
//! - [`RelayFrame`]: envelope spoken with a relay node over a websocket
//! - [`codec`]: CBOR encode/decode helpers

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod errors;

mod address;
mod message;
mod protocol;
mod relay;

pub use address::PeerAddress;
pub use codec::{decode_message, encode_message};
pub use errors::{ProtocolError, Result};
pub use message::ChatMessage;
pub use protocol::Protocol;
pub use relay::RelayFrame;
