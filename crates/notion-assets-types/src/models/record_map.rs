//! Record map returned by the Notion page API.
//!
//! Only the parts the shim reads are typed. Every other table and field is
//! kept in `extra` maps so a record map survives a decode/encode cycle intact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Table-keyed dump of the records that make up one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordMap {
    /// Block records keyed by block id.
    #[serde(default)]
    pub block: BTreeMap<String, BlockRecord>,

    /// Currently-signed file URLs keyed by block id.
    ///
    /// Values are usually strings; anything else is treated as absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_urls: Option<Map<String, Value>>,

    /// Remaining tables (`collection`, `notion_user`, `space`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Wrapper the API puts around each record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlockRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Block>,
}

/// A single block. `type` decides whether it carries a file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Block {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub block_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Block {
    /// Raw (unsigned) file URL stored at `properties.source[0][0]`.
    pub fn source_url(&self) -> Option<&str> {
        self.properties.as_ref()?.get("source")?.get(0)?.get(0)?.as_str()
    }

    /// Ids of child blocks listed in `content`. Non-string entries are skipped.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.content
            .as_ref()
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

impl RecordMap {
    /// Block value for `block_id`, if the record was loaded and readable.
    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.block.get(block_id)?.value.as_ref()
    }

    /// Block `type` for `block_id`.
    pub fn block_type(&self, block_id: &str) -> Option<&str> {
        self.block(block_id).map(|b| b.block_type.as_str())
    }

    /// Signed URL for `block_id`, only when stored as a string.
    pub fn signed_url(&self, block_id: &str) -> Option<&str> {
        self.signed_urls.as_ref()?.get(block_id)?.as_str()
    }

    /// Raw source URL embedded in the block's properties.
    pub fn raw_source_url(&self, block_id: &str) -> Option<&str> {
        self.block(block_id)?.source_url()
    }

    /// Record a signed URL, creating the table on first use.
    pub fn insert_signed_url(&mut self, block_id: impl Into<String>, url: impl Into<String>) {
        self.signed_urls
            .get_or_insert_with(Map::new)
            .insert(block_id.into(), Value::String(url.into()));
    }

    /// Copy block records from `other` that are not present yet.
    pub fn merge_blocks(&mut self, other: Self) {
        for (id, record) in other.block {
            self.block.entry(id).or_insert(record);
        }
    }
}
