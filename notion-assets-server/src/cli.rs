use clap::{Parser, Subcommand};
use std::path::PathBuf;

use notion_assets_types::ShimConfig;

#[derive(Parser)]
#[command(
    name = "notion-assets",
    about = "notion-assets - stable links for Notion file blocks",
    version = env!("CARGO_PKG_VERSION"),
    author,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(short, long, env = "NOTION_ASSETS_PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "NOTION_ASSETS_HOST")]
    pub host: Option<String>,

    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    #[arg(short, long, help = "Path to a JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "NOTION_API_BASE_URL", help = "Notion API base, e.g. https://www.notion.so/api/v3")]
    pub notion_api_base_url: Option<String>,

    #[arg(long, env = "NOTION_TOKEN_V2", hide_env_values = true, help = "token_v2 session cookie")]
    pub token_v2: Option<String>,

    #[arg(long, env = "NOTION_ACTIVE_USER", help = "Value for x-notion-active-user-header")]
    pub active_user: Option<String>,

    #[arg(
        long,
        env = "NOTION_ASSETS_ALLOWED_HOSTS",
        value_delimiter = ',',
        help = "Extra file-host domains (comma separated)"
    )]
    pub allowed_hosts: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the server (default if no command specified)")]
    Serve,

    #[command(about = "Print the effective configuration and exit")]
    CheckConfig,
}

impl Cli {
    /// Layer flags and environment over `config`. Unset flags keep the file value.
    pub fn apply_to(&self, config: &mut ShimConfig) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = &self.host {
            config.host.clone_from(host);
        }
        if let Some(base) = &self.notion_api_base_url {
            config.notion_api_base_url.clone_from(base);
        }
        if self.token_v2.is_some() {
            config.token_v2.clone_from(&self.token_v2);
        }
        if self.active_user.is_some() {
            config.active_user.clone_from(&self.active_user);
        }
        for host in &self.allowed_hosts {
            let host = host.trim();
            if !host.is_empty() && !config.allowed_hosts.iter().any(|h| h == host) {
                config.allowed_hosts.push(host.to_string());
            }
        }
    }
}
