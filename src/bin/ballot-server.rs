#![forbid(unsafe_code)]
//! Ballot ledger HTTP server

use ballotchain::api::{run_api_server, Node};
use ballotchain::blockchain::Blockchain;
use ballotchain::config::{load_config_from, DEFAULT_CONFIG_PATH};
use ballotchain::persistence::JsonFilePersistence;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Port to listen on, overriding the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = load_config_from(&cli.config)?;
    let roster = config.load_roster()?;
    let port = cli.port.unwrap_or(config.server.port);

    let persistence = JsonFilePersistence::new(config.data_file());
    tracing::info!(data_file = %persistence.path().display(), "opening ledger");
    let blockchain = Blockchain::open(roster, Box::new(persistence))?;

    let node = Node::new(blockchain, config.export_file()).with_cors(config.server.cors);
    let addr: SocketAddr = format!("{}:{}", config.server.host, port).parse()?;

    run_api_server(Arc::new(node), addr).await
}
