//! Console state machine.
//!
//! This module defines the [`Console`], the pure state behind the input loop.
//! It owns the prompt, the local echo buffer and the authoritative
//! [`SourceTable`]. It consumes [`ConsoleEvent`]s and produces
//! [`ConsoleAction`]s for the runtime to execute, in order.
//!
//! # Submit sequence
//!
//! On Enter the actions come out as: the submission's effect (broadcast or
//! add-peer), the local repaint if the line was echoed, the prompt repaint,
//! and finally any result line as a notice.

use parley_proto::{ChatMessage, PeerAddress};

use crate::{
    CommandProcessor, Effect, Geometry, KeyInput, PromptBuffer, PromptFrame, ScrollBuffer,
    SourceTable, ViewFrame,
};

/// Inputs to the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    /// Key pressed.
    Key(KeyInput),

    /// The router linked a peer requested with [`ConsoleAction::AddPeer`].
    PeerAdded {
        /// Linked peer.
        address: PeerAddress,
        /// Its nickname.
        nick: String,
    },

    /// The router could not link a requested peer.
    PeerAddFailed {
        /// Requested peer.
        address: PeerAddress,
        /// Human-readable reason.
        reason: String,
    },

    /// A linked peer failed and was dropped by the router.
    PeerDropped {
        /// Dropped peer.
        address: PeerAddress,
    },
}

/// Instructions produced by the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Send a local viewport frame to the render loop.
    RenderLocal(ViewFrame),

    /// Send a prompt frame to the render loop.
    RenderPrompt(PromptFrame),

    /// Ask the router to link a peer; report back with
    /// [`ConsoleEvent::PeerAdded`] or [`ConsoleEvent::PeerAddFailed`].
    AddPeer {
        /// Peer to link.
        address: PeerAddress,
        /// Nickname for its messages.
        nick: String,
    },

    /// Broadcast a message to every linked peer.
    Broadcast(ChatMessage),

    /// Show a system line in the remote viewport.
    Notice(String),

    /// Stop the application.
    Quit,
}

/// Input-side state of the chat client.
#[derive(Debug, Clone)]
pub struct Console {
    geometry: Geometry,
    prompt: PromptBuffer,
    local: ScrollBuffer,
    sources: SourceTable,
    processor: CommandProcessor,
    /// Rows the prompt footprint is pushed up because it ran past the bottom
    /// of the local viewport.
    prompt_shift: u16,
}

impl Console {
    /// Console for a screen of `geometry`, sending as `nick`, keeping at most
    /// `scrollback` local entries.
    pub fn new(geometry: Geometry, nick: impl Into<String>, scrollback: Option<usize>) -> Self {
        Self {
            geometry,
            prompt: PromptBuffer::new(geometry.width(), 0),
            local: ScrollBuffer::with_capacity(geometry.width(), scrollback),
            sources: SourceTable::new(),
            processor: CommandProcessor::new(nick),
            prompt_shift: 0,
        }
    }

    /// Frames for the first paint.
    pub fn start(&self) -> Vec<ConsoleAction> {
        vec![
            ConsoleAction::RenderLocal(self.local_frame()),
            ConsoleAction::RenderPrompt(self.prompt_frame(0)),
        ]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ConsoleEvent) -> Vec<ConsoleAction> {
        match event {
            ConsoleEvent::Key(key) => self.handle_key(key),
            ConsoleEvent::PeerAdded { address, nick } => {
                let notice = format!("added peer {nick} ({address})");
                self.sources.insert(address, nick);
                vec![ConsoleAction::Notice(notice)]
            },
            ConsoleEvent::PeerAddFailed { address: _, reason } => {
                vec![ConsoleAction::Notice(reason)]
            },
            ConsoleEvent::PeerDropped { address } => match self.sources.remove(&address) {
                Some(nick) => vec![ConsoleAction::Notice(format!("peer {nick} dropped ({address})"))],
                None => vec![],
            },
        }
    }

    fn handle_key(&mut self, key: KeyInput) -> Vec<ConsoleAction> {
        match key {
            KeyInput::Char(ch) => {
                let before = self.prompt.wrapped_rows();
                self.prompt.append(ch, before);
                self.prompt_actions(1)
            },
            KeyInput::Backspace => {
                let before = self.prompt.wrapped_rows();
                match self.prompt.remove_last(before) {
                    Some(_) => self.prompt_actions(1),
                    None => vec![],
                }
            },
            KeyInput::Enter => self.submit(),
            KeyInput::Esc => vec![ConsoleAction::Quit],
        }
    }

    fn submit(&mut self) -> Vec<ConsoleAction> {
        let line = self.prompt.text();
        let footprint = self.prompt.wrapped_rows() + 1;
        let submission = self.processor.process(&line, &self.sources, self.local.count());

        let mut actions = Vec::new();
        match submission.effect {
            Some(Effect::Broadcast(message)) => actions.push(ConsoleAction::Broadcast(message)),
            Some(Effect::AddPeer { address, nick }) => {
                actions.push(ConsoleAction::AddPeer { address, nick });
            },
            None => {},
        }

        let mut echoed_rows = 0;
        if submission.echo {
            echoed_rows = self.geometry.rows_for(self.prompt.count());
            self.local.add(None, line.chars());
        }

        self.prompt.reset();
        self.prompt.advance(echoed_rows, self.geometry.local_bottom());

        if submission.echo {
            self.prompt_shift = 0;
            actions.push(ConsoleAction::RenderLocal(self.local_frame()));
            actions.extend(self.prompt_actions(0));
        } else {
            actions.extend(self.prompt_actions(footprint));
        }

        if let Some(result) = submission.result {
            actions.push(ConsoleAction::Notice(result));
        }
        actions
    }

    /// Prompt repaint, preceded by a local repaint when the prompt's overflow
    /// shift changed.
    fn prompt_actions(&mut self, stale_rows: usize) -> Vec<ConsoleAction> {
        let shift = self.prompt.line().saturating_sub(self.geometry.local_bottom());
        let mut actions = Vec::with_capacity(2);
        if shift != self.prompt_shift {
            self.prompt_shift = shift;
            actions.push(ConsoleAction::RenderLocal(self.local_frame()));
        }
        actions.push(ConsoleAction::RenderPrompt(self.prompt_frame(stale_rows)));
        actions
    }

    /// Echo history above the prompt, blank below it.
    pub fn local_frame(&self) -> ViewFrame {
        let height = usize::from(self.geometry.local_height());
        let visible = self.prompt.anchor().saturating_sub(self.prompt_shift);
        let mut rows = self.local.tail(usize::from(visible));
        rows.resize(height, String::new());
        ViewFrame { top: 0, rows }
    }

    /// The prompt footprint plus `stale_rows` blank rows after it.
    fn prompt_frame(&self, stale_rows: usize) -> PromptFrame {
        let width = usize::from(self.geometry.width());
        let bottom = usize::from(self.geometry.local_bottom());
        let shift = usize::from(self.prompt_shift);
        let anchor = usize::from(self.prompt.anchor());
        let chars = self.prompt.chars();
        let footprint = self.prompt.wrapped_rows() + 1;

        let mut rows = Vec::with_capacity(footprint + stale_rows);
        for i in 0..footprint + stale_rows {
            let Some(y) = (anchor + i).checked_sub(shift) else {
                continue;
            };
            if y > bottom {
                break;
            }
            let text: String = chars.iter().skip(i * width).take(width).collect();
            rows.push((y as u16, text));
        }

        let (column, line) = self.prompt.cursor();
        PromptFrame { rows, cursor: (column, line.saturating_sub(self.prompt_shift)) }
    }

    /// Screen layout.
    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Prompt state.
    pub fn prompt(&self) -> &PromptBuffer {
        &self.prompt
    }

    /// Local echo buffer.
    pub fn local(&self) -> &ScrollBuffer {
        &self.local
    }

    /// Known peers.
    pub fn sources(&self) -> &SourceTable {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX20: &str = "00112233445566778899aabbccddeeff00112233";

    fn console() -> Console {
        Console::new(Geometry::from_terminal(10, 11).unwrap(), "self", None)
    }

    fn type_str(console: &mut Console, text: &str) -> Vec<ConsoleAction> {
        text.chars().flat_map(|ch| console.handle(ConsoleEvent::Key(KeyInput::Char(ch)))).collect()
    }

    fn enter(console: &mut Console) -> Vec<ConsoleAction> {
        console.handle(ConsoleEvent::Key(KeyInput::Enter))
    }

    fn last_prompt(actions: &[ConsoleAction]) -> Option<&PromptFrame> {
        actions.iter().rev().find_map(|action| match action {
            ConsoleAction::RenderPrompt(frame) => Some(frame),
            _ => None,
        })
    }

    #[test]
    fn start_paints_blank_local_and_prompt() {
        let actions = console().start();
        assert_eq!(actions.len(), 2);
        assert_eq!(
            actions[0],
            ConsoleAction::RenderLocal(ViewFrame { top: 0, rows: vec![String::new(); 5] })
        );
        assert_eq!(last_prompt(&actions).unwrap().cursor, (0, 0));
    }

    #[test]
    fn typing_repaints_prompt() {
        let mut console = console();
        let actions = type_str(&mut console, "hi");

        let frame = last_prompt(&actions).unwrap();
        assert_eq!(frame.rows[0], (0, "hi".to_string()));
        assert_eq!(frame.cursor, (2, 0));
        assert_eq!(console.prompt().text(), "hi");
    }

    #[test]
    fn typing_wraps_cursor() {
        let mut console = console();
        let actions = type_str(&mut console, "abcdefghijk");

        let frame = last_prompt(&actions).unwrap();
        assert_eq!(frame.rows[0], (0, "abcdefghij".to_string()));
        assert_eq!(frame.rows[1], (1, "k".to_string()));
        assert_eq!(frame.cursor, (1, 1));
    }

    #[test]
    fn backspace_on_empty_prompt_does_nothing() {
        let mut console = console();
        assert!(console.handle(ConsoleEvent::Key(KeyInput::Backspace)).is_empty());
    }

    #[test]
    fn backspace_clears_stale_row() {
        let mut console = console();
        type_str(&mut console, "abcdefghijk");
        let actions = console.handle(ConsoleEvent::Key(KeyInput::Backspace));

        let frame = last_prompt(&actions).unwrap();
        assert_eq!(frame.cursor, (0, 1));
        assert!(frame.rows.contains(&(1, String::new())));
    }

    #[test]
    fn plain_text_submit_sequence() {
        let mut console = console();
        type_str(&mut console, "hello");
        let actions = enter(&mut console);

        assert_eq!(actions.len(), 3);
        assert_eq!(actions[0], ConsoleAction::Broadcast(ChatMessage::new(0, "hello", "self")));
        let ConsoleAction::RenderLocal(local) = &actions[1] else {
            unreachable!("expected local frame, got {:?}", actions[1]);
        };
        assert_eq!(local.rows[0], "hello");
        assert_eq!(local.rows[1], "");
        assert_eq!(last_prompt(&actions).unwrap().cursor, (0, 1));
        assert!(console.prompt().is_empty());
        assert_eq!(console.local().count(), 1);
    }

    #[test]
    fn serial_is_local_count() {
        let mut console = console();
        type_str(&mut console, "one");
        enter(&mut console);
        type_str(&mut console, "two");
        let actions = enter(&mut console);

        assert_eq!(actions[0], ConsoleAction::Broadcast(ChatMessage::new(1, "two", "self")));
    }

    #[test]
    fn send_without_peers_reports_no_receivers() {
        let mut console = console();
        type_str(&mut console, "/send hello");
        let actions = enter(&mut console);

        assert!(matches!(actions[0], ConsoleAction::RenderPrompt(_)));
        assert_eq!(actions.last(), Some(&ConsoleAction::Notice("no receivers".into())));
        assert!(!actions.iter().any(|a| matches!(a, ConsoleAction::Broadcast(_))));
        assert_eq!(console.local().count(), 0);
        assert!(console.prompt().is_empty());
    }

    #[test]
    fn empty_submit_only_resets_prompt() {
        let mut console = console();
        type_str(&mut console, "hi");
        enter(&mut console);
        let local_before = console.local().count();

        type_str(&mut console, "   ");
        let actions = enter(&mut console);

        assert_eq!(console.local().count(), local_before);
        assert!(console.sources().is_empty());
        assert!(console.prompt().is_empty());
        assert_eq!(actions.len(), 1);
        assert_eq!(last_prompt(&actions).unwrap().cursor, (0, 1));
    }

    #[test]
    fn add_peer_round_trip() {
        let mut console = console();
        type_str(&mut console, &format!("/add {HEX20} alice"));
        let actions = enter(&mut console);

        let address = PeerAddress::from_hex(HEX20).unwrap();
        assert_eq!(
            actions[0],
            ConsoleAction::AddPeer { address: address.clone(), nick: "alice".into() }
        );
        assert_eq!(console.local().count(), 0);
        assert!(console.sources().is_empty());

        let actions =
            console.handle(ConsoleEvent::PeerAdded { address: address.clone(), nick: "alice".into() });
        assert_eq!(console.sources().len(), 1);
        assert_eq!(console.sources().nickname(&address), "alice");
        assert_eq!(actions, vec![ConsoleAction::Notice(format!("added peer alice ({HEX20})"))]);
    }

    #[test]
    fn failed_add_reports_reason() {
        let mut console = console();
        let actions = console.handle(ConsoleEvent::PeerAddFailed {
            address: PeerAddress::from_hex(HEX20).unwrap(),
            reason: "unreachable".into(),
        });
        assert_eq!(actions, vec![ConsoleAction::Notice("unreachable".into())]);
        assert!(console.sources().is_empty());
    }

    #[test]
    fn dropped_peer_can_be_added_again() {
        let mut console = console();
        let address = PeerAddress::from_hex(HEX20).unwrap();
        console.handle(ConsoleEvent::PeerAdded { address: address.clone(), nick: "alice".into() });

        let actions = console.handle(ConsoleEvent::PeerDropped { address: address.clone() });
        assert_eq!(actions, vec![ConsoleAction::Notice(format!("peer alice dropped ({HEX20})"))]);
        assert!(console.sources().is_empty());

        type_str(&mut console, "/send hi");
        let actions = enter(&mut console);
        assert_eq!(actions.last(), Some(&ConsoleAction::Notice("no receivers".into())));

        type_str(&mut console, &format!("/add {HEX20} alice"));
        let actions = enter(&mut console);
        assert_eq!(actions[0], ConsoleAction::AddPeer { address, nick: "alice".into() });
    }

    #[test]
    fn drop_of_unknown_peer_is_silent() {
        let mut console = console();
        let address = PeerAddress::from_hex(HEX20).unwrap();
        assert!(console.handle(ConsoleEvent::PeerDropped { address }).is_empty());
    }

    #[test]
    fn prompt_sticks_to_bottom_row() {
        let mut console = console();
        for i in 0..8 {
            type_str(&mut console, &format!("line {i}"));
            enter(&mut console);
        }
        assert_eq!(console.prompt().anchor(), 4);

        let local = console.local_frame();
        assert_eq!(local.rows, vec!["line 4", "line 5", "line 6", "line 7", ""]);
    }

    #[test]
    fn overflowing_prompt_shifts_up() {
        let mut console = console();
        for _ in 0..4 {
            type_str(&mut console, "x");
            enter(&mut console);
        }
        assert_eq!(console.prompt().anchor(), 4);

        let actions = type_str(&mut console, "abcdefghijkl");
        assert!(actions.iter().any(|a| matches!(a, ConsoleAction::RenderLocal(_))));
        let frame = last_prompt(&actions).unwrap();
        assert_eq!(frame.cursor, (2, 4));
        assert!(frame.rows.contains(&(3, "abcdefghij".to_string())));
        assert!(frame.rows.contains(&(4, "kl".to_string())));
    }

    #[test]
    fn esc_quits() {
        assert_eq!(console().handle(ConsoleEvent::Key(KeyInput::Esc)), vec![ConsoleAction::Quit]);
    }
}
