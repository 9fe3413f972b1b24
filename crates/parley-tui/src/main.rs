//! Parley entry point.

use std::process::ExitCode;

use clap::Parser;
use parley_client::websocket::WsTransport;
use parley_tui::{Args, Config, Runtime, RuntimeError, TerminalKeys, TerminalSurface, logging};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    logging::init();

    match run(Config::from(args)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "parley stopped");
            ExitCode::FAILURE
        },
    }
}

async fn run(config: Config) -> Result<(), RuntimeError> {
    tracing::info!(host = %config.host, port = config.port, "connecting to relay");
    let transport = WsTransport::connect(&config.host, config.port).await?;
    let surface = TerminalSurface::new()?;

    let shutdown = Runtime::new(config, transport, TerminalKeys::new(), surface).run().await?;
    shutdown.router.transport().stop();
    Ok(())
}
