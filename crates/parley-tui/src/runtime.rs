//! Async runtime
//!
//! Wires the four activities together and runs the input loop:
//!
//! - input dispatch (this task): reads keys and dropped-peer reports, drives
//!   the [`Console`], executes its actions against the router and the trigger
//!   channels
//! - render loop: spawned, owns the surface
//! - remote feed: spawned, owns the [`RemoteView`]
//! - router tasks: one send worker and one receive handler per peer
//!
//! The runtime is generic over the transport, the key source and the surface,
//! so the same orchestration runs against the terminal and in tests.

use parley_app::{
    Console, ConsoleAction, ConsoleEvent, Geometry, GeometryError, InputTriggers, RemoteView,
    TriggerClosed, run_remote_feed, trigger_channels,
};
use parley_client::{Inbound, Router, Transport, TransportError};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::{JoinError, JoinHandle},
};

use crate::{
    Config, KeySource, Surface, SurfaceError,
    render::{self, RenderError},
};

/// Runtime errors.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Terminal too small for the layout.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Terminal setup or key input failed.
    #[error("terminal error: {0}")]
    Surface(#[from] SurfaceError),

    /// Relay connection failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The render loop failed.
    #[error("render error: {0}")]
    Render(#[from] RenderError),

    /// The render loop went away while the input loop was running.
    #[error(transparent)]
    TriggerClosed(#[from] TriggerClosed),

    /// A spawned task panicked or was cancelled.
    #[error("task failed: {0}")]
    Join(#[from] JoinError),
}

/// Chat client runtime.
///
/// # Type Parameters
///
/// - `T`: peer transport
/// - `K`: key source
/// - `S`: surface painted by the render loop
pub struct Runtime<T, K, S> {
    config: Config,
    transport: T,
    keys: K,
    surface: S,
}

/// What is left after the input loop stops.
///
/// Peer links stay up until the router is dropped.
pub struct Shutdown<T: Transport, S> {
    /// Input-side state at exit.
    pub console: Console,
    /// Router with its peer links.
    pub router: Router<T>,
    /// Surface handed back by the render loop.
    pub surface: S,
    feed: JoinHandle<RemoteView>,
}

impl<T: Transport, S> Shutdown<T, S> {
    /// Drop every peer link and wait for the remote feed to drain.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Join` if the remote feed task panicked
    pub async fn close(self) -> Result<(Console, RemoteView, S), RuntimeError> {
        let Self { console, router, surface, feed } = self;
        drop(router);
        let remote = feed.await?;
        Ok((console, remote, surface))
    }
}

impl<T, K, S> Runtime<T, K, S>
where
    T: Transport,
    K: KeySource,
    S: Surface + Send + 'static,
{
    /// Create a runtime.
    pub fn new(config: Config, transport: T, keys: K, surface: S) -> Self {
        Self { config, transport, keys, surface }
    }

    /// Run until Esc or until the key source is exhausted.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Geometry` if the surface is too small
    /// - `RuntimeError::Surface` if reading keys fails
    /// - `RuntimeError::Render` if painting fails
    pub async fn run(self) -> Result<Shutdown<T, S>, RuntimeError> {
        let Self { config, transport, mut keys, surface } = self;

        let (cols, rows) = surface.size();
        let geometry = Geometry::from_terminal(cols, rows)?;
        tracing::info!(cols, rows, "starting console");

        let (triggers, remote_trigger, receivers) = trigger_channels();
        let render = tokio::spawn(render::run(surface, receivers, geometry));

        let (inbound_tx, inbound_rx) = mpsc::channel(config.inbound_capacity.max(1));
        let view = RemoteView::new(geometry, config.scrollback);
        let feed = tokio::spawn(run_remote_feed(view, inbound_rx, remote_trigger));

        let mut dispatch = Dispatch {
            console: Console::new(geometry, config.nick, config.scrollback),
            router: Router::new(transport, inbound_tx.clone()),
            triggers,
            notices: inbound_tx,
        };
        let outcome = dispatch.run(&mut keys).await;

        let Dispatch { console, router, triggers, notices } = dispatch;
        drop(notices);
        drop(triggers);

        let surface = render.await??;
        outcome?;

        Ok(Shutdown { console, router, surface, feed })
    }
}

/// Input-loop state.
struct Dispatch<T: Transport> {
    console: Console,
    router: Router<T>,
    triggers: InputTriggers,
    notices: mpsc::Sender<Inbound>,
}

impl<T: Transport> Dispatch<T> {
    async fn run<K: KeySource>(&mut self, keys: &mut K) -> Result<(), RuntimeError> {
        let start = self.console.start();
        if self.process_actions(start).await? {
            return Ok(());
        }

        loop {
            let event = tokio::select! {
                biased;

                Some(address) = self.router.next_dropped() => ConsoleEvent::PeerDropped { address },
                key = keys.next_key() => match key? {
                    Some(key) => ConsoleEvent::Key(key),
                    None => break,
                },
            };

            let actions = self.console.handle(event);
            if self.process_actions(actions).await? {
                return Ok(());
            }
        }

        tracing::info!("key source closed");
        Ok(())
    }

    /// Execute console actions. Returns `true` on quit.
    ///
    /// Router outcomes are fed back into the console and their actions queued
    /// behind the current batch.
    async fn process_actions(
        &mut self,
        initial_actions: Vec<ConsoleAction>,
    ) -> Result<bool, RuntimeError> {
        let mut pending_actions = initial_actions;

        while !pending_actions.is_empty() {
            let actions = std::mem::take(&mut pending_actions);

            for action in actions {
                match action {
                    ConsoleAction::RenderLocal(frame) => self.triggers.local(frame).await?,
                    ConsoleAction::RenderPrompt(frame) => self.triggers.prompt(frame).await?,
                    ConsoleAction::Broadcast(message) => {
                        let workers = self.router.broadcast(message);
                        tracing::debug!(workers, "message queued");
                    },
                    ConsoleAction::AddPeer { address, nick } => {
                        let event = match self.router.add_peer(address.clone(), nick.clone()).await
                        {
                            Ok(()) => ConsoleEvent::PeerAdded { address, nick },
                            Err(e) => ConsoleEvent::PeerAddFailed { address, reason: e.to_string() },
                        };
                        pending_actions.extend(self.console.handle(event));
                    },
                    ConsoleAction::Notice(text) => {
                        if self.notices.send(Inbound::Notice(text)).await.is_err() {
                            tracing::warn!("remote feed closed, notice dropped");
                        }
                    },
                    ConsoleAction::Quit => {
                        self.triggers.quit().await?;
                        return Ok(true);
                    },
                }
            }
        }

        Ok(false)
    }
}
