//! Per-request file URL resolution.
//!
//! Each request walks a fixed sequence of steps:
//!
//! ```text
//! FetchSigned ──ok──▶ UseSigned ──none──▶ UseRawSigned ──none──▶ (policy)
//!      │                                                          │
//!     err                                    Redirect: NotFound ◀─┤
//!      │                                                          │
//!      ▼                                         Stream:          ▼
//! FetchUnsigned ──ok──▶ UseRawUnsigned ──none──▶ NotFound    FetchUnsigned
//!      │
//!     err ──▶ Failed
//! ```
//!
//! The unsigned fetch is only issued after the signed one failed or came back
//! without a usable URL. Host classification is left to the caller so a
//! rejected URL never reaches the network.

use tracing::{debug, warn};

use notion_assets_types::{FileRef, RecordMap};

use crate::notion::{normalize_id, FetchOptions, NotionError, PageFetcher};

/// Where a resolved URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    /// Freshly signed by the API
    Signed,
    /// `properties.source` of the block
    Raw,
}

/// How far to fall back when the signed fetch succeeds without a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Stop at the signed record map: signed URL, else its raw URL.
    Redirect,
    /// Also refetch unsigned and try that map's raw URL.
    Stream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    FetchSigned,
    UseSigned,
    UseRawSigned,
    FetchUnsigned,
    UseRawUnsigned,
}

#[derive(Debug)]
pub enum Resolution {
    Found { url: String, source: UrlSource },
    NotFound,
    /// The last fetch attempted failed.
    Failed(NotionError),
}

impl Resolution {
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Found { url, .. } => Some(url),
            _ => None,
        }
    }
}

pub struct FileResolver<'a> {
    fetcher: &'a dyn PageFetcher,
    policy: FallbackPolicy,
}

impl<'a> FileResolver<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, policy: FallbackPolicy) -> Self {
        Self { fetcher, policy }
    }

    pub async fn resolve(&self, file: &FileRef) -> Resolution {
        let mut step = Step::FetchSigned;
        let mut signed_map: Option<RecordMap> = None;
        let mut unsigned_map: Option<RecordMap> = None;

        loop {
            debug!(?step, block_id = %file.block_id, "Resolving file URL");
            step = match step {
                Step::FetchSigned => {
                    match self.fetcher.get_page(&file.page_id, FetchOptions::signed()).await {
                        Ok(map) => {
                            signed_map = Some(map);
                            Step::UseSigned
                        },
                        Err(e) => {
                            warn!(
                                page_id = %file.page_id,
                                "Signed page fetch failed, retrying unsigned: {}", e
                            );
                            Step::FetchUnsigned
                        },
                    }
                },
                Step::UseSigned => {
                    if let Some(url) = signed_map.as_ref().and_then(|m| signed_url(m, file)) {
                        return Resolution::Found { url, source: UrlSource::Signed };
                    }
                    Step::UseRawSigned
                },
                Step::UseRawSigned => {
                    if let Some(url) = signed_map.as_ref().and_then(|m| raw_url(m, file)) {
                        return Resolution::Found { url, source: UrlSource::Raw };
                    }
                    match self.policy {
                        FallbackPolicy::Redirect => return Resolution::NotFound,
                        FallbackPolicy::Stream => Step::FetchUnsigned,
                    }
                },
                Step::FetchUnsigned => {
                    match self.fetcher.get_page(&file.page_id, FetchOptions::unsigned()).await {
                        Ok(map) => {
                            unsigned_map = Some(map);
                            Step::UseRawUnsigned
                        },
                        Err(e) => return Resolution::Failed(e),
                    }
                },
                Step::UseRawUnsigned => {
                    return match unsigned_map.as_ref().and_then(|m| raw_url(m, file)) {
                        Some(url) => Resolution::Found { url, source: UrlSource::Raw },
                        None => Resolution::NotFound,
                    };
                },
            };
        }
    }
}

/// Look up by the id as given, then by its dashed form.
fn lookup<'m>(
    map: &'m RecordMap,
    block_id: &str,
    get: impl Fn(&'m RecordMap, &str) -> Option<&'m str>,
) -> Option<String> {
    if let Some(found) = get(map, block_id) {
        return Some(found.to_string());
    }
    let dashed = normalize_id(block_id)?;
    if dashed == block_id {
        return None;
    }
    get(map, &dashed).map(str::to_string)
}

fn signed_url(map: &RecordMap, file: &FileRef) -> Option<String> {
    lookup(map, &file.block_id, |m, id| m.signed_url(id))
}

fn raw_url(map: &RecordMap, file: &FileRef) -> Option<String> {
    lookup(map, &file.block_id, |m, id| m.raw_source_url(id))
}
