//! End-to-end scenarios for the runtime.
//!
//! Keys are scripted, peers live on the in-memory transport and the screen is
//! a headless grid, so every activity runs exactly as in production.
//!
//! # Oracle Pattern
//!
//! Tests end with checks against the state handed back at shutdown:
//! - local and remote buffers hold exactly the expected entries
//! - the source table and transport saw exactly the expected peers
//! - the presented screen matches the local buffer and prompt

use std::collections::{HashSet, VecDeque};

use parley_app::{KeyInput, SourceTable};
use parley_client::memory::MemoryTransport;
use parley_proto::{ChatMessage, PeerAddress};
use parley_tui::{Config, GridSurface, KeySource, Runtime, RuntimeError, SurfaceError};
use tokio::sync::mpsc;

const HEX20: &str = "00112233445566778899aabbccddeeff00112233";

/// Replays a fixed key sequence, then reports the source exhausted.
struct ScriptedKeys {
    keys: VecDeque<KeyInput>,
}

impl ScriptedKeys {
    fn lines(lines: &[&str]) -> Self {
        let mut keys = VecDeque::new();
        for line in lines {
            keys.extend(line.chars().map(KeyInput::Char));
            keys.push_back(KeyInput::Enter);
        }
        keys.push_back(KeyInput::Esc);
        Self { keys }
    }
}

impl KeySource for ScriptedKeys {
    async fn next_key(&mut self) -> Result<Option<KeyInput>, SurfaceError> {
        Ok(self.keys.pop_front())
    }
}

/// Keys pushed by the test while the runtime is running.
struct ChannelKeys {
    rx: mpsc::UnboundedReceiver<KeyInput>,
}

impl KeySource for ChannelKeys {
    async fn next_key(&mut self) -> Result<Option<KeyInput>, SurfaceError> {
        Ok(self.rx.recv().await)
    }
}

fn type_line(tx: &mpsc::UnboundedSender<KeyInput>, line: &str) {
    for ch in line.chars() {
        tx.send(KeyInput::Char(ch)).unwrap();
    }
    tx.send(KeyInput::Enter).unwrap();
}

fn address() -> PeerAddress {
    PeerAddress::from_hex(HEX20).unwrap()
}

fn notices(view: &parley_app::RemoteView) -> Vec<String> {
    view.buffer().entries().filter(|e| e.source().is_none()).map(|e| e.text()).collect()
}

#[tokio::test]
async fn add_peer_registers_exactly_once() {
    let transport = MemoryTransport::new();
    let _alice = transport.register(address());
    let keys = ScriptedKeys::lines(&[&format!("/add {HEX20} alice")]);

    let runtime = Runtime::new(Config::default(), transport.clone(), keys, GridSurface::new(40, 11));
    let shutdown = runtime.run().await.unwrap();

    assert_eq!(transport.add_peer_calls(), vec![address()]);
    assert_eq!(shutdown.console.sources().len(), 1);
    assert_eq!(shutdown.console.sources().nickname(&address()), "alice");
    assert_eq!(shutdown.console.local().count(), 0);

    let (_, remote, _) = shutdown.close().await.unwrap();
    assert_eq!(remote.sources().nickname(&address()), "alice");
    assert_eq!(notices(&remote), vec![format!("added peer alice ({HEX20})")]);
}

#[tokio::test]
async fn failed_add_is_reported_and_not_registered() {
    let transport = MemoryTransport::new();
    let keys = ScriptedKeys::lines(&[&format!("/add {HEX20}")]);

    let shutdown = Runtime::new(Config::default(), transport.clone(), keys, GridSurface::new(40, 11))
        .run()
        .await
        .unwrap();

    assert_eq!(transport.add_peer_calls(), vec![address()]);
    assert!(shutdown.console.sources().is_empty());

    let (_, remote, _) = shutdown.close().await.unwrap();
    let notices = notices(&remote);
    assert_eq!(notices.len(), 1);
    assert!(notices[0].starts_with(&format!("could not add peer {HEX20}: ")));
}

#[tokio::test]
async fn send_without_peers_reports_no_receivers() {
    let keys = ScriptedKeys::lines(&["/send hello"]);

    let shutdown = Runtime::new(Config::default(), MemoryTransport::new(), keys, GridSurface::new(40, 11))
        .run()
        .await
        .unwrap();

    assert_eq!(shutdown.console.local().count(), 0);
    assert_eq!(shutdown.router.running_peers(), 0);
    assert_eq!(shutdown.surface.row(0), "");
    assert_eq!(shutdown.surface.cursor(), (0, 0));

    let (_, remote, _) = shutdown.close().await.unwrap();
    assert_eq!(notices(&remote), vec!["no receivers".to_string()]);
}

#[tokio::test]
async fn plain_text_reaches_peer_and_local_screen() {
    let transport = MemoryTransport::new();
    let mut alice = transport.register(address());
    let keys = ScriptedKeys::lines(&[&format!("/add {HEX20} alice"), "hello"]);

    let shutdown = Runtime::new(Config::default(), transport, keys, GridSurface::new(40, 11))
        .run()
        .await
        .unwrap();

    assert_eq!(alice.next_sent().await, Some(ChatMessage::new(0, "hello", "self")));
    assert_eq!(shutdown.surface.rows(0, 2), vec!["hello", ""]);
    assert_eq!(shutdown.surface.cursor(), (0, 1));
    assert_eq!(shutdown.surface.row(5), "─".repeat(40));
}

#[tokio::test]
async fn empty_lines_only_reset_the_prompt() {
    let keys = ScriptedKeys::lines(&["hi", "   ", ""]);

    let shutdown = Runtime::new(Config::default(), MemoryTransport::new(), keys, GridSurface::new(40, 11))
        .run()
        .await
        .unwrap();

    assert_eq!(shutdown.console.local().count(), 1);
    assert!(shutdown.console.sources().is_empty());
    assert!(shutdown.console.prompt().is_empty());
    assert_eq!(shutdown.console.prompt().anchor(), 1);
    assert_eq!(shutdown.surface.rows(0, 2), vec!["hi", ""]);
}

#[tokio::test]
async fn tiny_terminal_is_a_startup_error() {
    let keys = ScriptedKeys::lines(&[]);
    let result = Runtime::new(Config::default(), MemoryTransport::new(), keys, GridSurface::new(40, 2))
        .run()
        .await;
    assert!(matches!(result, Err(RuntimeError::Geometry(_))));
}

#[tokio::test]
async fn exhausted_key_source_stops_cleanly() {
    let keys = ScriptedKeys { keys: VecDeque::from([KeyInput::Char('x')]) };
    let shutdown = Runtime::new(Config::default(), MemoryTransport::new(), keys, GridSurface::new(40, 11))
        .run()
        .await
        .unwrap();

    assert_eq!(shutdown.console.prompt().text(), "x");
    assert_eq!(shutdown.surface.row(0), "x");
}

#[tokio::test]
async fn dropped_peer_can_be_added_again() {
    let transport = MemoryTransport::new();
    let mut alice = transport.register(address());
    let (key_tx, key_rx) = mpsc::unbounded_channel();
    let runtime = Runtime::new(
        Config::default(),
        transport.clone(),
        ChannelKeys { rx: key_rx },
        GridSurface::new(40, 11),
    );
    let running = tokio::spawn(runtime.run());

    type_line(&key_tx, &format!("/add {HEX20} alice"));
    type_line(&key_tx, "first");
    assert_eq!(alice.next_sent().await.map(|m| m.serial()), Some(0));

    alice.hang_up();
    type_line(&key_tx, "lost");
    alice.sink_dropped().await;

    let mut again = transport.register(address());
    type_line(&key_tx, &format!("/add {HEX20} alice"));
    type_line(&key_tx, "back");
    key_tx.send(KeyInput::Esc).unwrap();

    let shutdown = running.await.unwrap().unwrap();
    assert_eq!(transport.add_peer_calls(), vec![address(), address()]);
    assert_eq!(shutdown.router.running_peers(), 1);
    assert_eq!(shutdown.console.sources().nickname(&address()), "alice");
    assert_eq!(again.next_sent().await, Some(ChatMessage::new(2, "back", "self")));

    let (console, remote, _) = shutdown.close().await.unwrap();
    assert_eq!(console.local().count(), 3);
    assert_eq!(
        notices(&remote),
        vec![
            format!("added peer alice ({HEX20})"),
            format!("peer alice dropped ({HEX20})"),
            format!("added peer alice ({HEX20})"),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_inbound_and_submits_land_exactly_once() {
    const INBOUND: u64 = 40;
    const SUBMITS: usize = 25;

    let transport = MemoryTransport::new();
    let mut alice = transport.register(address());
    let (key_tx, key_rx) = mpsc::unbounded_channel();
    let runtime = Runtime::new(
        Config::default(),
        transport,
        ChannelKeys { rx: key_rx },
        GridSurface::new(30, 15),
    );
    let running = tokio::spawn(runtime.run());

    type_line(&key_tx, &format!("/add {HEX20} alice"));

    let delivery = alice.delivery();
    let inbound = tokio::spawn(async move {
        for serial in 0..INBOUND {
            delivery.deliver(&ChatMessage::new(serial, format!("in {serial}"), "alice")).unwrap();
            tokio::task::yield_now().await;
        }
    });
    for i in 0..SUBMITS {
        type_line(&key_tx, &format!("out {i}"));
    }
    key_tx.send(KeyInput::Esc).unwrap();

    inbound.await.unwrap();
    let shutdown = running.await.unwrap().unwrap();

    let mut sent = Vec::new();
    for _ in 0..SUBMITS {
        sent.push(alice.next_sent().await.unwrap().text().into_owned());
    }
    assert_eq!(sent, (0..SUBMITS).map(|i| format!("out {i}")).collect::<Vec<_>>());
    drop(alice);

    let (console, remote, _) = shutdown.close().await.unwrap();

    let local: Vec<String> = console.local().entries().map(|e| e.text()).collect();
    assert_eq!(local, (0..SUBMITS).map(|i| format!("out {i}")).collect::<Vec<_>>());

    let received: Vec<String> = remote
        .buffer()
        .entries()
        .filter(|e| e.source() == Some("alice"))
        .map(|e| e.text())
        .collect();
    let unique: HashSet<&String> = received.iter().collect();
    assert_eq!(received.len(), INBOUND as usize);
    assert_eq!(unique.len(), INBOUND as usize);
    assert!(remote.buffer().entries().all(|e| e.source() != Some(SourceTable::UNKNOWN)));
}
