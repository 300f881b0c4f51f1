//! Levelset - level-triggered reconciliation controller
//!
//! Loads `.env` and configuration, applies command-line overrides, then
//! runs until Ctrl-C or a line on stdin.

use anyhow::Context;
use clap::Parser;
use levelset_app::{AppContext, Cli};
use levelset_infra::{config, init_tracing};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_from_file(Some(path.clone()))?,
        None => config::load()?,
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    init_tracing(&config.logging)?;
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(err) => debug!(error = %err, "No .env file loaded"),
    }

    let context = AppContext::new(config).context("failed to build application context")?;
    tokio::spawn(wait_for_stop(context.stop_token()));
    info!("Running; press Ctrl-C or Enter to stop");

    context.run().await?;
    Ok(())
}

async fn wait_for_stop(stop: CancellationToken) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C"),
        () = stdin_line() => info!("Received stop request on stdin"),
        () = stop.cancelled() => return,
    }
    stop.cancel();
}

/// Resolves on the first line read; never resolves on EOF or a read error
async fn stdin_line() {
    let mut line = String::new();
    match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
        Ok(read) if read > 0 => {}
        _ => std::future::pending().await,
    }
}
