//! Domain models shared across the notion-assets crates.

mod config;
mod file_ref;
mod record_map;

pub use config::{ShimConfig, DEFAULT_ALLOWED_HOSTS, DEFAULT_NOTION_API_BASE_URL};
pub use file_ref::FileRef;
pub use record_map::{Block, BlockRecord, RecordMap};
