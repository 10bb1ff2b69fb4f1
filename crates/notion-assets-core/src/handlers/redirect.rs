//! `GET /api/notion-file?blockId=..&pageId=..`
//!
//! Resolves a fresh URL for one file block and answers with a 302 to it.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use notion_assets_types::ProxyError;

use super::{ensure_method, ErrorResponse, FileQuery};
use crate::host_policy::{host_of, redact_url};
use crate::resolve::{FallbackPolicy, FileResolver, Resolution};
use crate::server::AppState;

/// Signed URLs live about an hour; browsers and CDNs may reuse a redirect
/// for 55 minutes and serve it stale for a day while revalidating.
pub const REDIRECT_CACHE_CONTROL: &str = "public, max-age=3300, stale-while-revalidate=86400";

pub async fn handle_file_redirect(
    State(state): State<AppState>,
    method: Method,
    query: Option<Query<FileQuery>>,
) -> Result<Response, ErrorResponse> {
    ensure_method(&method, &[Method::GET])?;
    let file = query.map(|Query(q)| q).unwrap_or_default().into_file_ref()?;

    let resolver = FileResolver::new(state.fetcher.as_ref(), FallbackPolicy::Redirect);
    let (url, source) = match resolver.resolve(&file).await {
        Resolution::Found { url, source } => (url, source),
        Resolution::NotFound => {
            info!(block_id = %file.block_id, page_id = %file.page_id, "No file URL for block");
            return Err(ProxyError::NotFound { block_id: file.block_id, page_id: file.page_id }
                .into());
        },
        Resolution::Failed(e) => {
            error!(block_id = %file.block_id, page_id = %file.page_id, "File lookup failed: {}", e);
            return Err(ProxyError::upstream(e.to_string()).into());
        },
    };

    if !state.hosts.is_allowed(&url) {
        warn!(block_id = %file.block_id, url = %redact_url(&url), "Refusing redirect to untrusted host");
        let host = host_of(&url).unwrap_or_else(|| redact_url(&url));
        return Err(ProxyError::UntrustedHost { host }.into());
    }

    info!(block_id = %file.block_id, ?source, to = %redact_url(&url), "Redirecting to file");
    Ok(redirect_to(&url))
}

fn redirect_to(url: &str) -> Response {
    match location_header(url) {
        Some(location) => (
            StatusCode::FOUND,
            [
                (header::LOCATION, location),
                (header::CACHE_CONTROL, HeaderValue::from_static(REDIRECT_CACHE_CONTROL)),
            ],
        )
            .into_response(),
        None => ErrorResponse(ProxyError::upstream("unrepresentable Location header"))
            .into_response(),
    }
}

/// The checked URL verbatim; its percent-encoded form only when the raw
/// string is not a valid header value (e.g. non-ASCII paths).
fn location_header(url: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(url).ok().or_else(|| {
        let encoded = url::Url::parse(url).ok()?;
        HeaderValue::from_str(encoded.as_str()).ok()
    })
}
