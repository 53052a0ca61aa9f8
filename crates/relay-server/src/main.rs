//! Binary entry point for the TCP message relay.

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use relay_server::config::{Args, Config};
use relay_server::server::Server;

/// Set up tracing: stdout by default, or append to the configured file.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config: Config = Args::parse().into();
    init_logging(&config)?;

    let server = Server::bind(&config).await?;
    server.run().await
}
