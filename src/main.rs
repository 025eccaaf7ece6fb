use anyhow::Result;
use clap::Parser;
use splitter_lookup::config::{CliArgs, ServerConfig};
use splitter_lookup::server;
use splitter_lookup::state::AppState;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config = Arc::new(ServerConfig::from_args(args)?);
    let state = Arc::new(AppState::new(config));
    server::serve(state).await
}
