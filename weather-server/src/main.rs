//! Binary crate for the `weather-server` backend.
//!
//! This crate focuses on:
//! - Parsing CLI arguments and storing credentials
//! - Routing the dashboard and weather API over HTTP
//! - Translating provider outcomes into client-facing JSON

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod api;
mod cli;
mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
