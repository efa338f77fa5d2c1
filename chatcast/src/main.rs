mod server;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;

use chatcast_core::registry::StreamRegistry;
use chatcast_core::{logging, Config};
use chatcast_platforms::PlatformHandlerFactory;

use server::ChatcastServer;

#[derive(Debug, Parser)]
#[command(name = "chatcast", about = "Live-stream chat relay server")]
struct Args {
    /// Path to a TOML configuration file. Environment variables with the
    /// CHATCAST_ prefix override file values.
    #[arg(short, long, env = "CHATCAST_CONFIG")]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    logging::init_logging(&config.logging)?;
    info!("Chatcast server starting...");
    info!("HTTP address: {}", config.http_address());

    let factory = Arc::new(PlatformHandlerFactory::new(
        config.stats.clone(),
        config.redis.clone(),
    )?);
    let registry = StreamRegistry::new(factory, config.shutdown_grace());

    let server = ChatcastServer::new(config, registry);
    server.start().await
}
