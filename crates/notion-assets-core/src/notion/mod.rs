//! Notion page client.
//!
//! Handlers depend on the [`PageFetcher`] trait only. [`NotionClient`] is the
//! reqwest implementation talking to the Notion private API; tests plug in
//! scripted fetchers.

mod client;
mod id;

pub use client::{NotionClient, NotionClientConfig};
pub use id::normalize_id;

use async_trait::async_trait;
use thiserror::Error;

use notion_assets_types::RecordMap;

/// Block types whose source URL the API can sign.
pub const SIGNABLE_BLOCK_TYPES: &[&str] = &["pdf", "audio", "video", "file", "image"];

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum NotionError {
    /// Transport failure talking to the API.
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// API answered with a non-success status.
    #[error("Notion API {endpoint} returned HTTP {status}")]
    Status { endpoint: &'static str, status: u16 },

    /// Response body did not match the expected shape.
    #[error("Failed to decode {endpoint} response: {message}")]
    Decode { endpoint: &'static str, message: String },

    /// Identifier is not a Notion id.
    #[error("Invalid Notion id: {0}")]
    InvalidId(String),

    /// Client could not be built from its configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// Signing produced an unusable answer.
    #[error("URL signing failed: {0}")]
    Signing(String),
}

impl NotionError {
    /// Status code when the API rejected the request.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// What to load besides the page's own chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// Ask the API to sign embedded file URLs into `signed_urls`.
    pub sign_file_urls: bool,
    /// Load child blocks the first chunk did not include.
    pub fetch_missing_blocks: bool,
}

impl FetchOptions {
    /// All blocks of the page plus signed file URLs. Sub-pages and
    /// collections are never loaded.
    pub const fn signed() -> Self {
        Self { sign_file_urls: true, fetch_missing_blocks: true }
    }

    /// All blocks of the page, unsigned.
    pub const fn unsigned() -> Self {
        Self { sign_file_urls: false, fetch_missing_blocks: true }
    }
}

/// Anything that can produce a page's record map.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn get_page(&self, page_id: &str, options: FetchOptions)
        -> Result<RecordMap, NotionError>;
}
