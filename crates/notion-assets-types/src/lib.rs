//! # Notion Assets Types
//!
//! Core types, models, and error definitions for the notion-assets shim.
//!
//! - **`error`** - Typed error hierarchy for proxy requests and configuration
//! - **`models`** - Record map data model, file references, shim configuration
//!
//! ## Architecture Role
//!
//! `notion-assets-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!        notion-assets-types (this crate)
//!                 │
//!                 ▼
//!        notion-assets-core
//!                 │
//!                 ▼
//!       notion-assets-server
//! ```

pub mod error;
pub mod models;

pub use error::{ConfigError, ProxyError, Result, TypedError};

pub use models::{Block, BlockRecord, FileRef, RecordMap, ShimConfig};
