//! Render trigger channels.
//!
//! Four one-directional channels feed the render loop, one per trigger kind.
//! Each sender half is handed only to the activity that owns the matching
//! buffer: the input loop gets [`InputTriggers`] (local, prompt, quit) and the
//! remote feed gets [`RemoteTrigger`]. Frames carry the rows to paint, so the
//! render loop never reads a buffer.
//!
//! Channels hold a single frame; a sender waits until the previous frame on
//! its channel has been taken.

use thiserror::Error;
use tokio::sync::mpsc;

/// Rows to paint into one viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewFrame {
    /// Screen row of `rows[0]`.
    pub top: u16,
    /// Row contents, top to bottom. Short rows are padded with blanks when
    /// painted; the frame always covers the whole viewport.
    pub rows: Vec<String>,
}

/// Prompt rows to repaint and where the cursor goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptFrame {
    /// `(screen row, contents)` pairs.
    pub rows: Vec<(u16, String)>,
    /// Cursor position as `(column, row)`.
    pub cursor: (u16, u16),
}

/// The render loop has stopped listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("render loop is gone")]
pub struct TriggerClosed;

/// Triggers owned by the input loop.
#[derive(Debug, Clone)]
pub struct InputTriggers {
    local: mpsc::Sender<ViewFrame>,
    prompt: mpsc::Sender<PromptFrame>,
    quit: mpsc::Sender<()>,
}

impl InputTriggers {
    /// Repaint the local viewport.
    pub async fn local(&self, frame: ViewFrame) -> Result<(), TriggerClosed> {
        self.local.send(frame).await.map_err(|_| TriggerClosed)
    }

    /// Repaint the prompt and move the cursor.
    pub async fn prompt(&self, frame: PromptFrame) -> Result<(), TriggerClosed> {
        self.prompt.send(frame).await.map_err(|_| TriggerClosed)
    }

    /// Stop the render loop.
    pub async fn quit(&self) -> Result<(), TriggerClosed> {
        self.quit.send(()).await.map_err(|_| TriggerClosed)
    }
}

/// Trigger owned by the remote feed.
#[derive(Debug, Clone)]
pub struct RemoteTrigger {
    remote: mpsc::Sender<ViewFrame>,
}

impl RemoteTrigger {
    /// Repaint the remote viewport.
    pub async fn send(&self, frame: ViewFrame) -> Result<(), TriggerClosed> {
        self.remote.send(frame).await.map_err(|_| TriggerClosed)
    }
}

/// Receiving ends, owned by the render loop.
#[derive(Debug)]
pub struct TriggerReceivers {
    /// Local viewport frames.
    pub local: mpsc::Receiver<ViewFrame>,
    /// Remote viewport frames.
    pub remote: mpsc::Receiver<ViewFrame>,
    /// Prompt frames.
    pub prompt: mpsc::Receiver<PromptFrame>,
    /// Quit signal.
    pub quit: mpsc::Receiver<()>,
}

/// Create the four trigger channels.
pub fn trigger_channels() -> (InputTriggers, RemoteTrigger, TriggerReceivers) {
    let (local_tx, local_rx) = mpsc::channel(1);
    let (remote_tx, remote_rx) = mpsc::channel(1);
    let (prompt_tx, prompt_rx) = mpsc::channel(1);
    let (quit_tx, quit_rx) = mpsc::channel(1);

    (
        InputTriggers { local: local_tx, prompt: prompt_tx, quit: quit_tx },
        RemoteTrigger { remote: remote_tx },
        TriggerReceivers { local: local_rx, remote: remote_rx, prompt: prompt_rx, quit: quit_rx },
    )
}
