//! Record-map rewriting.
//!
//! Replaces expiring signed URLs of file blocks with stable local proxy
//! references. One [`Rewriter`] is configured with an ordered list of
//! [`RewriteRule`]s; the first rule whose block-type set contains the block's
//! type decides the local path. Blocks no rule claims (images in particular)
//! keep their signed URL so the renderer's own image pipeline still works.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};
use tracing::debug;

use notion_assets_types::RecordMap;

use crate::host_policy::HostAllowList;

/// Characters left alone by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Legacy PDF path, served by the streaming proxy.
pub const PDF_ASSET_TEMPLATE: &str = "/assets-pdf/{page_id}/{block_id}";

/// General file path, served by the redirect handler.
pub const FILE_REDIRECT_TEMPLATE: &str = "/api/notion-file?blockId={block_id}&pageId={page_id}";

/// Block types routed through the streaming PDF proxy.
pub const PDF_BLOCK_TYPES: &[&str] = &["pdf"];

/// Block types routed through the redirect handler.
pub const FILE_BLOCK_TYPES: &[&str] = &["pdf", "file", "audio", "video"];

/// Percent-encode one URL component the way `encodeURIComponent` does.
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Local path template with `{page_id}` and `{block_id}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPathTemplate(String);

impl ProxyPathTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    /// Substitute both placeholders with percent-encoded identifiers.
    pub fn render(&self, page_id: &str, block_id: &str) -> String {
        self.0
            .replace("{page_id}", &encode_component(page_id))
            .replace("{block_id}", &encode_component(block_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    block_types: Vec<String>,
    template: ProxyPathTemplate,
}

impl RewriteRule {
    pub fn new<I, S>(block_types: I, template: ProxyPathTemplate) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { block_types: block_types.into_iter().map(Into::into).collect(), template }
    }

    /// `pdf` blocks → `/assets-pdf/{page_id}/{block_id}`.
    pub fn pdf_stream() -> Self {
        Self::new(PDF_BLOCK_TYPES.iter().copied(), ProxyPathTemplate::new(PDF_ASSET_TEMPLATE))
    }

    /// `pdf`, `file`, `audio`, `video` blocks → redirect endpoint.
    pub fn file_redirect() -> Self {
        Self::new(FILE_BLOCK_TYPES.iter().copied(), ProxyPathTemplate::new(FILE_REDIRECT_TEMPLATE))
    }

    pub fn matches(&self, block_type: &str) -> bool {
        self.block_types.iter().any(|t| t == block_type)
    }

    pub fn template(&self) -> &ProxyPathTemplate {
        &self.template
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewriter {
    rules: Vec<RewriteRule>,
}

impl Default for Rewriter {
    /// PDFs stream through `/assets-pdf`, other files redirect.
    fn default() -> Self {
        Self::new(vec![RewriteRule::pdf_stream(), RewriteRule::file_redirect()])
    }
}

impl Rewriter {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Only PDFs, to the streaming path.
    pub fn legacy_pdf() -> Self {
        Self::new(vec![RewriteRule::pdf_stream()])
    }

    /// All file-bearing blocks, to the redirect endpoint.
    pub fn files() -> Self {
        Self::new(vec![RewriteRule::file_redirect()])
    }

    /// Local proxy reference for one entry, or `None` to keep the original URL.
    pub fn local_reference(
        &self,
        block_type: &str,
        url: &str,
        page_id: &str,
        block_id: &str,
        hosts: &HostAllowList,
    ) -> Option<String> {
        let rule = self.rules.iter().find(|r| r.matches(block_type))?;
        if !hosts.is_allowed(url) {
            return None;
        }
        Some(rule.template.render(page_id, block_id))
    }

    /// Return a copy of `record_map` with `signed_urls` rewritten.
    ///
    /// Non-string entries are dropped. Everything except `signed_urls` is an
    /// unmodified clone of the input.
    pub fn rewrite(
        &self,
        record_map: &RecordMap,
        page_id: &str,
        hosts: &HostAllowList,
    ) -> RecordMap {
        let Some(signed_urls) = record_map.signed_urls.as_ref() else {
            return record_map.clone();
        };

        let mut rewritten = Map::new();
        let mut replaced = 0usize;
        for (block_id, value) in signed_urls {
            let Some(url) = value.as_str() else {
                continue;
            };
            let block_type = record_map.block_type(block_id).unwrap_or_default();
            match self.local_reference(block_type, url, page_id, block_id, hosts) {
                Some(local) => {
                    replaced += 1;
                    rewritten.insert(block_id.clone(), Value::String(local));
                },
                None => {
                    rewritten.insert(block_id.clone(), Value::String(url.to_string()));
                },
            }
        }
        debug!(page_id, replaced, total = signed_urls.len(), "Rewrote signed URLs");

        RecordMap { signed_urls: Some(rewritten), ..record_map.clone() }
    }
}
