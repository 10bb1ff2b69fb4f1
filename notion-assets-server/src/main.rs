//! notion-assets server - headless daemon
//!
//! Serves stable same-origin links for Notion file blocks:
//! - `/api/notion-file` redirects to a freshly signed file URL
//! - `/api/pdf-proxy` and `/assets-pdf/*` stream the file through
//! - `/api/page/*` returns a page record map with file links rewritten
//!
//! Access via: http://localhost:3000

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod router;
mod server_utils;

use cli::{Cli, Commands};
use notion_assets_core::{config::load_config, AppState};
use notion_assets_types::ShimConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ShimConfig::default(),
    };
    cli.apply_to(&mut config);
    config.validate()?;

    match cli.command {
        Some(Commands::CheckConfig) => print_config(&config),
        Some(Commands::Serve) | None => serve(config).await,
    }
}

async fn serve(config: ShimConfig) -> Result<()> {
    info!("notion-assets {} starting on {}...", env!("CARGO_PKG_VERSION"), config.socket_addr()?);

    let state = AppState::from_config(&config)?;
    info!(allowed_hosts = ?state.hosts.domains(), "File host allow-list");

    let app = router::build_router(state);
    let listener = server_utils::create_listener(&config).await?;

    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let reason = server_utils::wait_for_shutdown().await;
            info!("Received {}, draining in-flight file streams", reason);
        })
        .await?;

    info!("Server stopped");
    Ok(())
}

fn print_config(config: &ShimConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.token_v2.is_some() {
        shown.token_v2 = Some("<redacted>".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
