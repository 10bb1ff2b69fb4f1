//! Shared fixtures for unit and handler tests.

use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use notion_assets_types::RecordMap;

use crate::host_policy::HostAllowList;
use crate::notion::{FetchOptions, NotionError, PageFetcher};
use crate::server::{file_client, AppState};

pub const BLOCK_ID: &str = "block-1";
pub const PAGE_ID: &str = "page-1";

/// Fetcher that replays a fixed list of results and records every call.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<RecordMap, NotionError>>>,
    calls: Mutex<Vec<FetchOptions>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<RecordMap, NotionError>>) -> Self {
        Self { script: Mutex::new(script.into()), calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<FetchOptions> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn get_page(
        &self,
        _page_id: &str,
        options: FetchOptions,
    ) -> Result<RecordMap, NotionError> {
        self.calls.lock().unwrap().push(options);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(NotionError::Status { endpoint: "loadPageChunk", status: 500 }))
    }
}

/// Page with one `pdf` block (`block-1`) and the given URLs.
pub fn pdf_page(signed: Option<&str>, raw: Option<&str>) -> RecordMap {
    file_page("pdf", signed, raw)
}

pub fn file_page(block_type: &str, signed: Option<&str>, raw: Option<&str>) -> RecordMap {
    let mut block = json!({ "id": BLOCK_ID, "type": block_type });
    if let Some(raw) = raw {
        block["properties"] = json!({ "source": [[raw]] });
    }
    let mut map: RecordMap =
        serde_json::from_value(json!({ "block": { BLOCK_ID: { "role": "reader", "value": block } } }))
            .unwrap();
    if let Some(signed) = signed {
        map.insert_signed_url(BLOCK_ID, signed);
    }
    map
}

pub fn signing_error() -> NotionError {
    NotionError::Status { endpoint: "getSignedFileUrls", status: 401 }
}

/// State around a scripted fetcher; `extra_hosts` extends the allow-list.
pub fn test_state(fetcher: Arc<ScriptedFetcher>, extra_hosts: &[&str]) -> AppState {
    AppState::new(fetcher, file_client("notion-assets-tests", None).unwrap())
        .with_hosts(HostAllowList::with_extra(extra_hosts.iter().copied()))
}
