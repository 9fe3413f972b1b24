//! Application layer for parley
//!
//! Pure state for the chat console plus the channel plumbing that connects it
//! to the render loop. Every buffer here has exactly one owner:
//!
//! - [`Console`] owns the prompt, the local echo buffer and the authoritative
//!   [`SourceTable`]; it runs on the input loop
//! - [`RemoteView`] owns the remote buffer and a replica of the source table;
//!   it runs inside [`run_remote_feed`]
//!
//! Owners compute the rows to paint and ship them through the trigger
//! channels, so the render loop never reads a buffer.
//!
//! # Components
//!
//! - [`PromptBuffer`]: in-progress input line with wrap-aware cursor
//! - [`ScrollBuffer`]: append-only log with wrapped row accounting
//! - [`command`]: classification of submitted lines
//! - [`Geometry`]: fixed screen layout

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod command;

mod console;
mod feed;
mod geometry;
mod input;
mod prompt;
mod remote;
mod scroll;
mod sources;
mod trigger;

pub use command::{Command, CommandError, CommandProcessor, Effect, Submission};
pub use console::{Console, ConsoleAction, ConsoleEvent};
pub use feed::run_remote_feed;
pub use geometry::{Geometry, GeometryError};
pub use input::KeyInput;
pub use prompt::PromptBuffer;
pub use remote::RemoteView;
pub use scroll::{Entry, ScrollBuffer};
pub use sources::SourceTable;
pub use trigger::{
    InputTriggers, PromptFrame, RemoteTrigger, TriggerClosed, TriggerReceivers, ViewFrame,
    trigger_channels,
};
