//! # Notion Assets Core
//!
//! Keeps Notion file links alive behind stable local URLs.
//!
//! ```text
//! notion-assets-core/src/
//! ├── host_policy.rs  # file host allow-list, applied to every upstream URL
//! ├── rewrite.rs      # signed_urls → local proxy references
//! ├── notion/         # PageFetcher trait + reqwest Notion API client
//! ├── resolve.rs      # signed → raw → unsigned fallback state machine
//! ├── handlers/       # redirect, streaming proxy, rewritten page endpoints
//! ├── server.rs       # AppState + router
//! └── config.rs       # JSON config file loading
//! ```

#![cfg_attr(test, allow(clippy::panic, clippy::print_stdout))]

pub mod config;
pub mod handlers;
pub mod host_policy;
pub mod notion;
pub mod resolve;
pub mod rewrite;
pub mod server;

pub use host_policy::HostAllowList;
pub use notion::{FetchOptions, NotionClient, NotionError, PageFetcher};
pub use resolve::{FallbackPolicy, FileResolver, Resolution, UrlSource};
pub use rewrite::{ProxyPathTemplate, RewriteRule, Rewriter};
pub use server::{build_file_router, file_client, AppState};

#[cfg(test)]
pub(crate) mod tests;
