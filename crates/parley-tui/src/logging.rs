//! Log output.
//!
//! Once the UI owns the terminal, anything printed to stderr lands on top of
//! the screen. Logs therefore go to the file named by [`LOG_FILE_ENV`] when it
//! is set. Otherwise they go to stderr, and events emitted while the screen is
//! taken are discarded.

use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
    sync::Mutex,
};

use tracing::Metadata;
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self,
        writer::{BoxMakeWriter, MakeWriter, MakeWriterExt},
    },
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::surface::screen_taken;

/// Environment variable naming a file to append logs to.
pub const LOG_FILE_ENV: &str = "PARLEY_LOG_FILE";

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber.
///
/// A log file that cannot be opened falls back to stderr, with a warning.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let path = std::env::var_os(LOG_FILE_ENV);

    let (writer, failure) = match path.as_deref().map(|p| open_log(Path::new(p))) {
        Some(Ok(file)) => (BoxMakeWriter::new(Mutex::new(file)), None),
        Some(Err(e)) => (BoxMakeWriter::new(while_screen_free(io::stderr)), Some(e)),
        None => (BoxMakeWriter::new(while_screen_free(io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    if let Some(e) = failure {
        tracing::warn!(error = %e, var = LOG_FILE_ENV, "could not open log file, using stderr");
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Wrap `inner` so that nothing is written while the UI owns the terminal.
fn while_screen_free<M>(inner: M) -> impl for<'a> MakeWriter<'a> + Send + Sync + 'static
where
    M: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    inner.with_filter(|_: &Metadata<'_>| !screen_taken())
}
