//! The `(blockId, pageId)` pair that identifies a file.

use serde::{Deserialize, Serialize};

use crate::error::ProxyError;

/// Joint key for a file: a block's URL is only valid in the context of the
/// page that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub block_id: String,
    pub page_id: String,
}

impl FileRef {
    /// Build from optional request parameters. Empty values count as missing.
    pub fn from_params(
        block_id: Option<String>,
        page_id: Option<String>,
    ) -> Result<Self, ProxyError> {
        let block_id =
            block_id.filter(|s| !s.is_empty()).ok_or_else(|| ProxyError::missing("blockId"))?;
        let page_id =
            page_id.filter(|s| !s.is_empty()).ok_or_else(|| ProxyError::missing("pageId"))?;
        Ok(Self { block_id, page_id })
    }
}
