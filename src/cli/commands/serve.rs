use clap::Args;

use crate::app;
use crate::config::{AppConfig, StoreBackend};

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "Use the in-memory record store")]
    pub memory: bool,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.memory {
        config.store.backend = StoreBackend::Memory;
    }

    app::serve(&config).await
}
