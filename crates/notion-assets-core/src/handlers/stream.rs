//! Streaming file proxy.
//!
//! `GET|HEAD /api/pdf-proxy?blockId=..&pageId=..` and
//! `GET|HEAD /assets-pdf/{pageId}/{blockId}` resolve a fresh upstream URL and
//! pipe the upstream response through unchanged, so the browser sees a
//! same-origin file that supports range requests and conditional caching.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, Method},
    response::Response,
};
use futures::TryStreamExt;
use tracing::{debug, error, warn};

use notion_assets_types::{FileRef, ProxyError};

use super::{ensure_method, ErrorResponse, FileQuery};
use crate::host_policy::{host_of, redact_url};
use crate::resolve::{FallbackPolicy, FileResolver, Resolution};
use crate::server::AppState;

/// Request headers copied to the upstream request when present.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 3] =
    [header::RANGE, header::IF_NONE_MATCH, header::IF_MODIFIED_SINCE];

/// Upstream response headers passed back to the client.
pub const PASSTHROUGH_RESPONSE_HEADERS: [HeaderName; 7] = [
    header::ACCEPT_RANGES,
    header::CACHE_CONTROL,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
    header::CONTENT_TYPE,
    header::ETAG,
    header::LAST_MODIFIED,
];

/// Redirect hops followed for one file request.
pub const MAX_FILE_REDIRECTS: usize = 5;

/// Used only when upstream did not send its own `cache-control`.
pub const DEFAULT_STREAM_CACHE_CONTROL: &str = "public, max-age=300, stale-while-revalidate=3600";

pub async fn handle_pdf_proxy(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Option<Query<FileQuery>>,
) -> Result<Response, ErrorResponse> {
    ensure_method(&method, &[Method::GET, Method::HEAD])?;
    let file = query.map(|Query(q)| q).unwrap_or_default().into_file_ref()?;
    proxy_file(&state, &method, &headers, &file).await.map_err(ErrorResponse::from)
}

/// Path form emitted by the PDF rewrite rule.
pub async fn handle_pdf_asset(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    Path((page_id, block_id)): Path<(String, String)>,
) -> Result<Response, ErrorResponse> {
    ensure_method(&method, &[Method::GET, Method::HEAD])?;
    let file = FileRef::from_params(Some(block_id), Some(page_id))?;
    proxy_file(&state, &method, &headers, &file).await.map_err(ErrorResponse::from)
}

async fn proxy_file(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    file: &FileRef,
) -> Result<Response, ProxyError> {
    let resolver = FileResolver::new(state.fetcher.as_ref(), FallbackPolicy::Stream);
    let url = match resolver.resolve(file).await {
        Resolution::Found { url, .. } => url,
        Resolution::NotFound => {
            warn!(block_id = %file.block_id, page_id = %file.page_id, "No file URL for block");
            return Err(ProxyError::upstream("no signed or raw URL"));
        },
        Resolution::Failed(e) => {
            error!(block_id = %file.block_id, page_id = %file.page_id, "File lookup failed: {}", e);
            return Err(ProxyError::upstream(e.to_string()));
        },
    };

    let upstream = fetch_following_redirects(state, method, headers, url, &file.block_id).await?;

    let mut response_headers = HeaderMap::new();
    for name in &PASSTHROUGH_RESPONSE_HEADERS {
        if let Some(value) = upstream.headers().get(name) {
            response_headers.insert(name.clone(), value.clone());
        }
    }
    if !response_headers.contains_key(header::CACHE_CONTROL) {
        response_headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static(DEFAULT_STREAM_CACHE_CONTROL),
        );
    }

    let status = upstream.status();
    let body = if *method == Method::HEAD {
        Body::empty()
    } else {
        let block_id = file.block_id.clone();
        // A body error after the headers went out makes hyper drop the
        // client connection instead of leaving it open.
        Body::from_stream(upstream.bytes_stream().inspect_err(move |e| {
            error!(block_id = %block_id, "File stream interrupted: {}", e);
        }))
    };

    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = response_headers;
    Ok(response)
}

/// Send the file request, following redirects only to allowed hosts. The
/// first URL is checked too, so nothing untrusted is ever contacted.
async fn fetch_following_redirects(
    state: &AppState,
    method: &Method,
    headers: &HeaderMap,
    mut url: String,
    block_id: &str,
) -> Result<reqwest::Response, ProxyError> {
    for hop in 0..=MAX_FILE_REDIRECTS {
        if !state.hosts.is_allowed(&url) {
            warn!(block_id, hop, url = %redact_url(&url), "Refusing to fetch untrusted host");
            let host = host_of(&url).unwrap_or_else(|| redact_url(&url));
            return Err(ProxyError::UntrustedHost { host });
        }

        let mut request = state.http_client.request(method.clone(), &url);
        for name in &FORWARDED_REQUEST_HEADERS {
            if let Some(value) = headers.get(name) {
                request = request.header(name.clone(), value.clone());
            }
        }

        let upstream = request.send().await.map_err(|e| {
            error!(url = %redact_url(&url), "Upstream file request failed: {}", e);
            ProxyError::upstream(e.to_string())
        })?;
        debug!(status = upstream.status().as_u16(), url = %redact_url(&url), "Upstream file response");

        match redirect_target(&url, &upstream) {
            Some(next) => url = next,
            None => return Ok(upstream),
        }
    }

    error!(block_id, "Gave up after {} file redirects", MAX_FILE_REDIRECTS);
    Err(ProxyError::upstream("too many redirects"))
}

/// Absolute `Location` of a redirect response. `304 Not Modified` and
/// redirects without a usable `Location` are returned to the client as-is.
fn redirect_target(current: &str, response: &reqwest::Response) -> Option<String> {
    if !matches!(response.status().as_u16(), 301 | 302 | 303 | 307 | 308) {
        return None;
    }
    let location = response.headers().get(header::LOCATION)?.to_str().ok()?;
    let base = url::Url::parse(current).ok()?;
    base.join(location).ok().map(String::from)
}
