//! Request-level errors for the file proxy endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors a proxy request can end in.
///
/// The `Display` output is meant for logs. Clients only ever see
/// [`ProxyError::client_message`], which carries no internal detail.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ProxyError {
    /// HTTP method not accepted by the endpoint
    #[error("Method {method} not allowed (allowed: {allowed})")]
    MethodNotAllowed {
        /// Method the client used
        method: String,
        /// Value for the `Allow` response header
        allowed: String,
    },

    /// Required query/path parameter missing or empty
    #[error("Missing required parameter: {name}")]
    MissingParameter {
        /// Parameter name as the client sends it (`blockId`, `pageId`)
        name: String,
    },

    /// Identifier could not be parsed as a Notion id
    #[error("Invalid identifier: {id}")]
    InvalidId {
        /// The rejected identifier
        id: String,
    },

    /// Resolved URL points at a host outside the allow-list
    #[error("Refusing untrusted host: {host}")]
    UntrustedHost {
        /// Host (or raw URL when unparsable) that failed the check
        host: String,
    },

    /// No signed or raw URL exists for the block
    #[error("No file URL for block {block_id} on page {page_id}")]
    NotFound {
        /// Block identifier
        block_id: String,
        /// Page identifier
        page_id: String,
    },

    /// Upstream API or file host failed after all fallbacks
    #[error("Upstream unavailable: {message}")]
    UpstreamUnavailable {
        /// Internal description, logged only
        message: String,
    },
}

impl ProxyError {
    /// Convenience constructor for a missing parameter.
    pub fn missing(name: &str) -> Self {
        Self::MissingParameter { name: name.to_string() }
    }

    /// Convenience constructor for an upstream failure.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable { message: message.into() }
    }

    /// Check if this is a client error (4xx equivalent).
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::MethodNotAllowed { .. }
                | Self::MissingParameter { .. }
                | Self::InvalidId { .. }
                | Self::UntrustedHost { .. }
                | Self::NotFound { .. }
        )
    }

    /// Get HTTP status code for this error.
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::MethodNotAllowed { .. } => 405,
            Self::MissingParameter { .. } | Self::InvalidId { .. } | Self::UntrustedHost { .. } => {
                400
            },
            Self::NotFound { .. } => 404,
            Self::UpstreamUnavailable { .. } => 502,
        }
    }

    /// Fixed, generic text returned to the client for this error.
    pub const fn client_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "Method not allowed",
            Self::MissingParameter { .. } => "Missing blockId or pageId",
            Self::InvalidId { .. } => "Invalid identifier",
            Self::UntrustedHost { .. } => "Invalid file host",
            Self::NotFound { .. } => "File not found",
            Self::UpstreamUnavailable { .. } => "Failed to fetch file",
        }
    }
}
