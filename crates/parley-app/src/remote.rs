//! Remote conversation state.

use parley_client::Inbound;

use crate::{Geometry, ScrollBuffer, SourceTable, ViewFrame};

/// Remote buffer plus the nicknames needed to label it.
///
/// The source table here is a replica: it learns peers from
/// [`Inbound::PeerUp`] events, which the router emits before a peer's
/// receive handler starts. A message therefore never arrives ahead of its
/// peer's nickname.
#[derive(Debug, Clone)]
pub struct RemoteView {
    geometry: Geometry,
    buffer: ScrollBuffer,
    sources: SourceTable,
}

impl RemoteView {
    /// Empty view for `geometry`, keeping at most `scrollback` entries.
    pub fn new(geometry: Geometry, scrollback: Option<usize>) -> Self {
        Self {
            geometry,
            buffer: ScrollBuffer::with_capacity(geometry.width(), scrollback),
            sources: SourceTable::new(),
        }
    }

    /// Apply an event. Returns the frame to paint if the buffer changed.
    pub fn handle(&mut self, event: Inbound) -> Option<ViewFrame> {
        match event {
            Inbound::Message { from, message } => {
                let nick = self.sources.nickname(&from).to_string();
                self.buffer.add(Some(nick), message.text().chars());
            },
            Inbound::Notice(text) => self.buffer.add(None, text.chars()),
            Inbound::PeerUp { address, nick } => {
                // The newest link owns both the address and the nickname.
                self.sources.remove(&address);
                if let Some(previous) = self.sources.address(&nick).cloned() {
                    self.sources.remove(&previous);
                }
                self.sources.insert(address, nick);
                return None;
            },
        }
        Some(self.frame())
    }

    /// The newest rows, filling the remote viewport.
    pub fn frame(&self) -> ViewFrame {
        let height = usize::from(self.geometry.remote_height());
        let mut rows = self.buffer.tail(height);
        rows.resize(height, String::new());
        ViewFrame { top: self.geometry.remote_top(), rows }
    }

    /// Remote buffer.
    pub fn buffer(&self) -> &ScrollBuffer {
        &self.buffer
    }

    /// Replicated nicknames.
    pub fn sources(&self) -> &SourceTable {
        &self.sources
    }
}

#[cfg(test)]
mod tests {
    use parley_proto::{ChatMessage, PeerAddress};

    use super::*;

    fn view() -> RemoteView {
        RemoteView::new(Geometry::from_terminal(20, 7).unwrap(), None)
    }

    fn address(byte: u8) -> PeerAddress {
        PeerAddress::from_bytes(vec![byte; 20]).unwrap()
    }

    #[test]
    fn messages_are_labelled_with_nickname() {
        let mut view = view();
        assert_eq!(view.handle(Inbound::PeerUp { address: address(1), nick: "alice".into() }), None);

        let frame = view
            .handle(Inbound::Message { from: address(1), message: ChatMessage::new(0, "hi", "x") })
            .unwrap();

        assert_eq!(frame.top, 4);
        assert_eq!(frame.rows, vec!["alice hi", "", ""]);
        assert_eq!(view.sources().len(), 1);
    }

    #[test]
    fn relinked_peer_takes_latest_nickname() {
        let mut view = view();
        view.handle(Inbound::PeerUp { address: address(1), nick: "alice".into() });
        view.handle(Inbound::PeerUp { address: address(1), nick: "al".into() });
        assert_eq!(view.sources().nickname(&address(1)), "al");

        // A dropped peer's nickname may be reused by another address.
        view.handle(Inbound::PeerUp { address: address(2), nick: "al".into() });
        assert_eq!(view.sources().nickname(&address(2)), "al");
        assert_eq!(view.sources().nickname(&address(1)), SourceTable::UNKNOWN);
        assert_eq!(view.sources().len(), 1);
    }

    #[test]
    fn unknown_sender_is_labelled_unknown() {
        let mut view = view();
        view.handle(Inbound::Message { from: address(2), message: ChatMessage::new(0, "yo", "x") });
        assert_eq!(view.buffer().entries().next().unwrap().source(), Some(SourceTable::UNKNOWN));
    }

    #[test]
    fn notices_have_no_label() {
        let mut view = view();
        let frame = view.handle(Inbound::Notice("no receivers".into())).unwrap();
        assert_eq!(frame.rows[0], "no receivers");
        assert_eq!(view.buffer().count(), 1);
    }

    #[test]
    fn frame_keeps_newest_rows() {
        let mut view = view();
        for i in 0..5 {
            view.handle(Inbound::Notice(format!("n{i}")));
        }
        assert_eq!(view.frame().rows, vec!["n2", "n3", "n4"]);
    }
}
