#![forbid(unsafe_code)]
//! HTTP server for the carbon credit ledger

use std::path::PathBuf;
use std::sync::Arc;

use carbonledger::api::run_api_server;
use carbonledger::config::{load_config_from, DEFAULT_CONFIG_PATH};
use carbonledger::node::Node;
use clap::Parser;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let config = load_config_from(&args.config)?;
    info!(
        difficulty = config.ledger.difficulty,
        max_attempts = ?config.ledger.max_attempts,
        "starting carbon ledger"
    );

    let node = Arc::new(Node::from_config(&config));
    run_api_server(node, &config).await
}
