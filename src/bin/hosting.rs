//! Session hosting server.
//!
//! Serves the session API over HTTP and live play over WebSocket, with
//! agents backed by a local Ollama server.

use clap::Parser;
use pokerroom::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log(log::LevelFilter::Info)?;
    kys();
    hosting::Server::run(hosting::Settings::parse()).await
}
