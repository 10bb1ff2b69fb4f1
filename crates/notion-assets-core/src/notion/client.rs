use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, warn};

use notion_assets_types::{RecordMap, ShimConfig};

use super::{normalize_id, FetchOptions, NotionError, PageFetcher, SIGNABLE_BLOCK_TYPES};

const DEFAULT_USER_AGENT: &str = concat!("notion-assets/", env!("CARGO_PKG_VERSION"));
const ACTIVE_USER_HEADER: &str = "x-notion-active-user-header";

/// Blocks requested per `loadPageChunk` call.
const PAGE_CHUNK_LIMIT: u32 = 100;

/// Upper bound on `syncRecordValues` rounds when filling in missing blocks.
const MAX_MISSING_BLOCK_ROUNDS: usize = 8;

/// Source URLs the API knows how to sign.
fn is_signable_source(source: &str) -> bool {
    source.contains("secure.notion-static.com")
        || source.contains("prod-files-secure")
        || source.starts_with("attachment:")
}

fn is_page_block(block_type: &str) -> bool {
    matches!(block_type, "page" | "collection_view_page")
}

#[derive(Debug, Clone)]
pub struct NotionClientConfig {
    /// API base, e.g. `https://www.notion.so/api/v3`
    pub api_base_url: String,
    /// `token_v2` session cookie
    pub token_v2: Option<String>,
    pub active_user: Option<String>,
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
}

impl NotionClientConfig {
    pub fn from_shim_config(config: &ShimConfig) -> Self {
        Self {
            api_base_url: config.notion_api_base_url.clone(),
            token_v2: config.token_v2.clone(),
            active_user: config.active_user.clone(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: config.upstream_connect_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl Default for NotionClientConfig {
    fn default() -> Self {
        Self::from_shim_config(&ShimConfig::default())
    }
}

#[derive(Deserialize)]
struct RecordMapResponse {
    #[serde(rename = "recordMap", default)]
    record_map: RecordMap,
}

#[derive(Deserialize)]
struct SignedFileUrlsResponse {
    #[serde(rename = "signedUrls", default)]
    signed_urls: Vec<String>,
}

/// Client for the Notion private API. Configuration is fixed at construction.
pub struct NotionClient {
    http_client: Client,
    base_url: String,
    headers: header::HeaderMap,
}

impl NotionClient {
    /// Build a client with its own connection pool.
    pub fn new(config: NotionClientConfig) -> Result<Self, NotionError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http_client = builder.build()?;
        Self::with_http_client(http_client, config)
    }

    /// Build on top of an existing `reqwest::Client`.
    pub fn with_http_client(
        http_client: Client,
        config: NotionClientConfig,
    ) -> Result<Self, NotionError> {
        let base_url = config.api_base_url.trim().trim_end_matches('/').to_string();
        if url::Url::parse(&base_url).is_err() {
            return Err(NotionError::Config(format!("invalid API base URL '{}'", base_url)));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("application/json"));
        if let Some(token) = config.token_v2.as_deref() {
            let cookie = header::HeaderValue::from_str(&format!("token_v2={}", token))
                .map_err(|_| NotionError::Config("token_v2 is not a valid header value".into()))?;
            headers.insert(header::COOKIE, cookie);
        }
        if let Some(user) = config.active_user.as_deref() {
            let value = header::HeaderValue::from_str(user)
                .map_err(|_| NotionError::Config("active_user is not a valid header value".into()))?;
            headers.insert(ACTIVE_USER_HEADER, value);
        }

        Ok(Self { http_client, base_url, headers })
    }

    pub fn has_credentials(&self) -> bool {
        self.headers.contains_key(header::COOKIE)
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        body: &Value,
    ) -> Result<T, NotionError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response =
            self.http_client.post(&url).headers(self.headers.clone()).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            debug!(endpoint, status = status.as_u16(), "Notion API request rejected");
            return Err(NotionError::Status { endpoint, status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| NotionError::Decode { endpoint, message: e.to_string() })
    }

    /// First chunk of a page (blocks only, no collections).
    pub async fn load_page_chunk(&self, page_id: &str) -> Result<RecordMap, NotionError> {
        let body = json!({
            "pageId": page_id,
            "limit": PAGE_CHUNK_LIMIT,
            "cursor": { "stack": [] },
            "chunkNumber": 0,
            "verticalColumns": false,
        });
        let response: RecordMapResponse = self.post("loadPageChunk", &body).await?;
        Ok(response.record_map)
    }

    /// Block records for `block_ids`.
    pub async fn sync_record_values(&self, block_ids: &[String]) -> Result<RecordMap, NotionError> {
        let requests: Vec<Value> = block_ids
            .iter()
            .map(|id| json!({ "pointer": { "table": "block", "id": id }, "version": -1 }))
            .collect();
        let response: RecordMapResponse =
            self.post("syncRecordValues", &json!({ "requests": requests })).await?;
        Ok(response.record_map)
    }

    /// Signed URLs for `(block_id, source_url)` pairs, in request order.
    pub async fn get_signed_file_urls(
        &self,
        files: &[(String, String)],
    ) -> Result<Vec<String>, NotionError> {
        let urls: Vec<Value> = files
            .iter()
            .map(|(block_id, url)| {
                json!({ "permissionRecord": { "table": "block", "id": block_id }, "url": url })
            })
            .collect();
        let response: SignedFileUrlsResponse =
            self.post("getSignedFileUrls", &json!({ "urls": urls })).await?;
        Ok(response.signed_urls)
    }

    /// Load blocks listed in `content` but absent from the map. Child pages
    /// are leaves: their own content belongs to another page.
    async fn fill_missing_blocks(
        &self,
        record_map: &mut RecordMap,
        page_id: &str,
    ) -> Result<(), NotionError> {
        for _ in 0..MAX_MISSING_BLOCK_ROUNDS {
            let missing: BTreeSet<String> = record_map
                .block
                .values()
                .filter_map(|record| record.value.as_ref())
                .filter(|block| block.id == page_id || !is_page_block(&block.block_type))
                .flat_map(|block| block.child_ids())
                .filter(|id| !record_map.block.contains_key(*id))
                .map(str::to_string)
                .collect();
            if missing.is_empty() {
                return Ok(());
            }

            let ids: Vec<String> = missing.into_iter().collect();
            debug!(count = ids.len(), "Fetching missing blocks");
            let fetched = self.sync_record_values(&ids).await?;
            let before = record_map.block.len();
            record_map.merge_blocks(fetched);
            if record_map.block.len() == before {
                // API returned none of them; stop instead of asking again.
                return Ok(());
            }
        }
        warn!("Gave up filling missing blocks after {} rounds", MAX_MISSING_BLOCK_ROUNDS);
        Ok(())
    }

    async fn sign_file_urls(&self, record_map: &mut RecordMap) -> Result<(), NotionError> {
        let files: Vec<(String, String)> = record_map
            .block
            .iter()
            .filter_map(|(id, record)| {
                let block = record.value.as_ref()?;
                if !SIGNABLE_BLOCK_TYPES.contains(&block.block_type.as_str()) {
                    return None;
                }
                if block.block_type == "image"
                    && !block
                        .extra
                        .get("file_ids")
                        .and_then(Value::as_array)
                        .is_some_and(|ids| !ids.is_empty())
                {
                    return None;
                }
                let source = block.source_url()?;
                is_signable_source(source).then(|| (id.clone(), source.to_string()))
            })
            .collect();

        if files.is_empty() {
            return Ok(());
        }

        let signed = self.get_signed_file_urls(&files).await?;
        if signed.len() != files.len() {
            return Err(NotionError::Signing(format!(
                "requested {} signed URLs, received {}",
                files.len(),
                signed.len()
            )));
        }

        for ((block_id, _), url) in files.into_iter().zip(signed) {
            record_map.insert_signed_url(block_id, url);
        }
        Ok(())
    }
}

#[async_trait]
impl PageFetcher for NotionClient {
    async fn get_page(
        &self,
        page_id: &str,
        options: FetchOptions,
    ) -> Result<RecordMap, NotionError> {
        let id = normalize_id(page_id).ok_or_else(|| NotionError::InvalidId(page_id.to_string()))?;

        let mut record_map = self.load_page_chunk(&id).await?;
        if options.fetch_missing_blocks {
            self.fill_missing_blocks(&mut record_map, &id).await?;
        }
        if options.sign_file_urls {
            self.sign_file_urls(&mut record_map).await?;
        }
        Ok(record_map)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_signable_sources() {
        assert!(is_signable_source(
            "https://s3-us-west-2.amazonaws.com/secure.notion-static.com/a.pdf"
        ));
        assert!(is_signable_source("https://prod-files-secure.s3.us-west-2.amazonaws.com/a/b.pdf"));
        assert!(is_signable_source("attachment:0f1e:report.pdf"));
        assert!(!is_signable_source("https://example.com/public.pdf"));
    }

    #[test]
    fn test_page_blocks() {
        assert!(is_page_block("page"));
        assert!(is_page_block("collection_view_page"));
        assert!(!is_page_block("column_list"));
    }

    #[test]
    fn test_config_headers() {
        let config = NotionClientConfig {
            token_v2: Some("secret".to_string()),
            active_user: Some("user-1".to_string()),
            ..NotionClientConfig::default()
        };

        let client = NotionClient::with_http_client(Client::new(), config).unwrap();

        assert!(client.has_credentials());
        assert_eq!(client.headers[header::COOKIE], "token_v2=secret");
        assert_eq!(client.headers[ACTIVE_USER_HEADER], "user-1");
        assert_eq!(client.base_url, "https://www.notion.so/api/v3");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bad_url = NotionClientConfig {
            api_base_url: "not a url".to_string(),
            ..NotionClientConfig::default()
        };
        assert!(matches!(
            NotionClient::with_http_client(Client::new(), bad_url),
            Err(NotionError::Config(_))
        ));

        let bad_token = NotionClientConfig {
            token_v2: Some("line\nbreak".to_string()),
            ..NotionClientConfig::default()
        };
        assert!(matches!(
            NotionClient::with_http_client(Client::new(), bad_token),
            Err(NotionError::Config(_))
        ));
    }
}
