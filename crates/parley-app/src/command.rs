//! Command processing.
//!
//! A submitted line is first classified by [`parse`] into a [`Command`], then
//! [`CommandProcessor::process`] turns it into a [`Submission`]: an optional
//! result line for the remote viewport, an optional [`Effect`] for the runtime
//! to carry out, and whether the line is echoed locally.
//!
//! # Syntax
//!
//! - `/add <hex-address> [nick]`: link a new peer
//! - `/send <text>`: send text; refused when no peer is known
//! - anything else: plain chat text
//!
//! Directive tokens are case-sensitive and must be followed by whitespace or
//! the end of the line.

use parley_proto::{ChatMessage, PeerAddress, ProtocolError};
use thiserror::Error;

use crate::SourceTable;

/// Token of the add-peer directive.
pub const ADD_TOKEN: &str = "/add";

/// Token of the send directive.
pub const SEND_TOKEN: &str = "/send";

/// Result line for a send with nobody to receive it.
pub const NO_RECEIVERS: &str = "no receivers";

/// Classified input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Nothing but whitespace.
    Empty,
    /// Link a new peer.
    AddPeer {
        /// Decoded peer address.
        address: PeerAddress,
        /// Nickname given after the address, if any.
        nick: Option<String>,
    },
    /// Explicit send of the given text.
    Send(String),
    /// Plain chat text.
    Plain(String),
}

/// Errors classifying a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `/add` without an address.
    #[error("/add: missing peer address")]
    MissingAddress,

    /// `/add` with an address that does not decode.
    #[error("/add: {0}")]
    InvalidAddress(#[from] ProtocolError),
}

/// Classify `line`.
///
/// # Errors
///
/// - `CommandError::MissingAddress` for a bare `/add`
/// - `CommandError::InvalidAddress` if the `/add` address is not valid hex of
///   an accepted length
pub fn parse(line: &str) -> Result<Command, CommandError> {
    if line.trim().is_empty() {
        return Ok(Command::Empty);
    }

    if let Some(args) = directive(line, ADD_TOKEN) {
        let mut words = args.split_whitespace();
        let hex = words.next().ok_or(CommandError::MissingAddress)?;
        let address = PeerAddress::from_hex(hex)?;
        let nick = words.next().map(str::to_string);
        return Ok(Command::AddPeer { address, nick });
    }

    if let Some(text) = directive(line, SEND_TOKEN) {
        return Ok(Command::Send(text.to_string()));
    }

    Ok(Command::Plain(line.to_string()))
}

/// Arguments after `token`, if `line` starts with it as a whole word.
fn directive<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(token)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Something the runtime must do for a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a link to a peer through the router.
    AddPeer {
        /// Peer to link.
        address: PeerAddress,
        /// Nickname to label the peer with.
        nick: String,
    },
    /// Hand a message to every linked peer.
    Broadcast(ChatMessage),
}

/// Outcome of processing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Line shown in the remote viewport, if any.
    pub result: Option<String>,
    /// Action for the runtime, if any.
    pub effect: Option<Effect>,
    /// Whether the line is appended to the local buffer.
    pub echo: bool,
}

impl Submission {
    fn silent() -> Self {
        Self { result: None, effect: None, echo: false }
    }

    fn rejected(result: impl Into<String>) -> Self {
        Self { result: Some(result.into()), effect: None, echo: false }
    }
}

/// Turns submitted lines into submissions on behalf of the local user.
#[derive(Debug, Clone)]
pub struct CommandProcessor {
    nick: String,
}

impl CommandProcessor {
    /// Processor sending as `nick`.
    pub fn new(nick: impl Into<String>) -> Self {
        Self { nick: nick.into() }
    }

    /// Nickname stamped on outgoing messages.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Process `line`.
    ///
    /// `serial` becomes the serial of any outgoing message; the caller passes
    /// the local buffer's entry count.
    pub fn process(&self, line: &str, sources: &SourceTable, serial: u64) -> Submission {
        let command = match parse(line) {
            Ok(command) => command,
            Err(e) => return Submission::rejected(e.to_string()),
        };

        match command {
            Command::Empty => Submission::silent(),
            Command::AddPeer { address, nick } => {
                if sources.contains(&address) {
                    let known = sources.nickname(&address);
                    return Submission::rejected(format!("peer {known} already added"));
                }
                let nick = nick.unwrap_or_else(|| address.short());
                if let Some(owner) = sources.address(&nick) {
                    return Submission::rejected(format!("nickname {nick} already used by {owner}"));
                }
                Submission { result: None, effect: Some(Effect::AddPeer { address, nick }), echo: false }
            },
            Command::Send(text) => {
                if sources.is_empty() {
                    return Submission::rejected(NO_RECEIVERS);
                }
                let effect = (!text.is_empty())
                    .then(|| Effect::Broadcast(ChatMessage::new(serial, text, self.nick.as_str())));
                Submission { result: None, effect, echo: true }
            },
            Command::Plain(text) => Submission {
                result: None,
                effect: Some(Effect::Broadcast(ChatMessage::new(serial, text, self.nick.as_str()))),
                echo: true,
            },
        }
    }
}
