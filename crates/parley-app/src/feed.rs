//! Remote feed task.

use parley_client::Inbound;
use tokio::sync::mpsc;

use crate::{RemoteTrigger, RemoteView};

/// Drain `inbound` into `view`, sending a frame after every change.
///
/// Paints the current frame first. Runs until every inbound sender is gone
/// and returns the view. If the render loop goes away the feed keeps
/// consuming events so senders never block, it just stops painting.
pub async fn run_remote_feed(
    mut view: RemoteView,
    mut inbound: mpsc::Receiver<Inbound>,
    trigger: RemoteTrigger,
) -> RemoteView {
    let mut painting = trigger.send(view.frame()).await.is_ok();

    while let Some(event) = inbound.recv().await {
        let Some(frame) = view.handle(event) else {
            continue;
        };
        if painting && trigger.send(frame).await.is_err() {
            tracing::debug!("render loop closed, remote feed stops painting");
            painting = false;
        }
    }

    view
}
