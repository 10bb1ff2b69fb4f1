//! Typed error definitions for notion-assets.
//!
//! Errors are displayable and matchable, composed with thiserror derive
//! macros. Only [`ProxyError`] is serializable; it is the one a caller
//! outside the process can see.

mod config;
mod proxy;

pub use config::ConfigError;
pub use proxy::ProxyError;

use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
#[derive(Debug, Error)]
pub enum TypedError {
    /// Wraps a proxy request error
    #[error("Proxy error: {0}")]
    Proxy(#[from] ProxyError),

    /// Wraps a configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Standard Result type using TypedError.
pub type Result<T> = std::result::Result<T, TypedError>;
