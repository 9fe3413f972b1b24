//! Render loop.
//!
//! The only task that touches the surface. It waits on the four trigger
//! channels and paints exactly the region the trigger names:
//!
//! - local frame: rows `0..local_height`
//! - remote frame: rows `remote_top..remote_top + remote_height`
//! - prompt frame: the listed prompt rows, then the cursor
//! - quit: stop without painting
//!
//! Every repaint is followed by one flush. Pending frames are drained in a
//! fixed priority (local, remote, prompt) before a quit is honoured.

use parley_app::{Geometry, PromptFrame, TriggerReceivers, ViewFrame};
use ratatui::style::Color;
use thiserror::Error;

use crate::{Surface, SurfaceError};

/// Divider glyph between the two viewports.
const DIVIDER: char = '─';

/// Render loop errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Painting or presenting failed.
    #[error("surface error: {0}")]
    Surface(#[from] SurfaceError),
}

/// Run the render loop until quit, then hand the surface back.
///
/// # Errors
///
/// - `RenderError::Surface` if a flush fails; the loop stops
pub async fn run<S: Surface>(
    mut surface: S,
    mut triggers: TriggerReceivers,
    geometry: Geometry,
) -> Result<S, RenderError> {
    paint_divider(&mut surface, geometry);
    surface.flush()?;

    loop {
        tokio::select! {
            biased;

            Some(frame) = triggers.local.recv() => paint_view(&mut surface, geometry, &frame),
            Some(frame) = triggers.remote.recv() => paint_view(&mut surface, geometry, &frame),
            Some(frame) = triggers.prompt.recv() => paint_prompt(&mut surface, geometry, &frame),
            _ = triggers.quit.recv() => break,
        }
        surface.flush()?;
    }

    tracing::debug!("render loop stopped");
    Ok(surface)
}

fn paint_divider<S: Surface>(surface: &mut S, geometry: Geometry) {
    let y = geometry.divider_row();
    for x in 0..geometry.width() {
        surface.set_cell(x, y, DIVIDER, Color::DarkGray, Color::Reset);
    }
}

fn paint_view<S: Surface>(surface: &mut S, geometry: Geometry, frame: &ViewFrame) {
    for (offset, text) in frame.rows.iter().enumerate() {
        let Ok(offset) = u16::try_from(offset) else {
            break;
        };
        paint_row(surface, geometry, frame.top.saturating_add(offset), text);
    }
}

fn paint_prompt<S: Surface>(surface: &mut S, geometry: Geometry, frame: &PromptFrame) {
    for (y, text) in &frame.rows {
        paint_row(surface, geometry, *y, text);
    }
    surface.set_cursor(frame.cursor.0, frame.cursor.1);
}

/// Paint `text` on row `y`, blanking the rest of the row.
fn paint_row<S: Surface>(surface: &mut S, geometry: Geometry, y: u16, text: &str) {
    let mut chars = text.chars();
    for x in 0..geometry.width() {
        let ch = chars.next().unwrap_or(' ');
        surface.set_cell(x, y, ch, Color::Reset, Color::Reset);
    }
}
