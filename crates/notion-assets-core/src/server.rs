use axum::{
    routing::{any, get},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use notion_assets_types::ShimConfig;

use crate::handlers;
use crate::host_policy::HostAllowList;
use crate::notion::{NotionClient, NotionClientConfig, NotionError, PageFetcher};
use crate::rewrite::Rewriter;

/// Shared, immutable request context. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<dyn PageFetcher>,
    /// Client for fetching file bytes; see [`file_client`].
    pub http_client: reqwest::Client,
    pub hosts: Arc<HostAllowList>,
    pub rewriter: Arc<Rewriter>,
}

impl AppState {
    pub fn new(fetcher: Arc<dyn PageFetcher>, http_client: reqwest::Client) -> Self {
        Self {
            fetcher,
            http_client,
            hosts: Arc::new(HostAllowList::default()),
            rewriter: Arc::new(Rewriter::default()),
        }
    }

    pub fn with_hosts(mut self, hosts: HostAllowList) -> Self {
        self.hosts = Arc::new(hosts);
        self
    }

    pub fn with_rewriter(mut self, rewriter: Rewriter) -> Self {
        self.rewriter = Arc::new(rewriter);
        self
    }

    /// Wire a [`NotionClient`] and file client from configuration.
    pub fn from_config(config: &ShimConfig) -> Result<Self, NotionError> {
        let client_config = NotionClientConfig::from_shim_config(config);
        let http_client = file_client(&client_config.user_agent, client_config.connect_timeout)?;

        let notion = NotionClient::new(client_config)?;
        tracing::info!(
            authenticated = notion.has_credentials(),
            "Notion client configured for {}",
            config.notion_api_base_url
        );

        Ok(Self::new(Arc::new(notion), http_client)
            .with_hosts(HostAllowList::with_extra(&config.allowed_hosts)))
    }
}

/// Client for file hosts. It never follows redirects itself; the stream
/// handler follows them hop by hop so every target passes the allow-list.
pub fn file_client(
    user_agent: &str,
    connect_timeout: Option<Duration>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .redirect(reqwest::redirect::Policy::none());
    if let Some(timeout) = connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder.build()
}

/// Routes served by the shim.
pub fn build_file_router(state: AppState) -> Router<()> {
    Router::new()
        .route("/api/notion-file", any(handlers::redirect::handle_file_redirect))
        .route("/api/pdf-proxy", any(handlers::stream::handle_pdf_proxy))
        .route("/assets-pdf/:page_id/:block_id", any(handlers::stream::handle_pdf_asset))
        .route("/api/page/:page_id", get(handlers::page::handle_page))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
