//! `greensat-bridge [CONFIG.json]`
//!
//! Log level comes from `RUST_LOG` (default `info`), the serial port from
//! `GREENSAT_PORT` when set.

use env_logger::Env;
use log::{error, info, warn};

use greensat_bridge::{AnySink, BridgeConfig, BridgeError, IngestLoop, SystemClock};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for ctrl-c ({}), running until the link closes", e);
        std::future::pending::<()>().await;
    }
}

async fn run() -> Result<(), BridgeError> {
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    }
    .with_env();
    config.validate()?;

    info!("greensat-bridge {}", greensat_bridge::VERSION);

    let sink = AnySink::open(&config.sink).await?;
    let source = greensat_bridge::source::open_serial(&config)?;

    let mut ingest = IngestLoop::new(source, sink, SystemClock);
    let stats = ingest.run_until(shutdown_signal()).await?;

    info!(
        "stopped: {} lines, {} stored, {} discarded, {} sink failures",
        stats.lines_received,
        stats.persisted,
        stats.total_discarded(),
        stats.sink_failures
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BridgeError> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let result = run().await;
    if let Err(e) = &result {
        error!("{}", e);
    }
    result
}
