//! Shim configuration model.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default base URL of the Notion private API.
pub const DEFAULT_NOTION_API_BASE_URL: &str = "https://www.notion.so/api/v3";

/// Hosts that serve Notion files. Subdomains are included.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &["amazonaws.com", "notion.so"];

/// Runtime configuration, loaded once at process start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShimConfig {
    /// Listen IP address (a literal, not a hostname)
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Base URL of the Notion API (`.../api/v3`)
    pub notion_api_base_url: String,
    /// `token_v2` session cookie for private workspaces
    pub token_v2: Option<String>,
    /// Value for the `x-notion-active-user-header` header
    pub active_user: Option<String>,
    /// Extra file-host domains on top of [`DEFAULT_ALLOWED_HOSTS`]
    pub allowed_hosts: Vec<String>,
    /// Connect timeout for upstream requests; unset keeps the client default
    pub upstream_connect_timeout_secs: Option<u64>,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            notion_api_base_url: DEFAULT_NOTION_API_BASE_URL.to_string(),
            token_v2: None,
            active_user: None,
            allowed_hosts: Vec::new(),
            upstream_connect_timeout_secs: None,
        }
    }
}

impl ShimConfig {
    /// Check values that would only fail later at bind or request time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::invalid("port", "must be non-zero"));
        }
        self.socket_addr()?;

        let base = self.notion_api_base_url.trim();
        if base.is_empty() {
            return Err(ConfigError::invalid("notion_api_base_url", "must not be empty"));
        }
        match url::Url::parse(base) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {},
            Ok(u) => {
                return Err(ConfigError::invalid(
                    "notion_api_base_url",
                    format!("unsupported scheme '{}'", u.scheme()),
                ));
            },
            Err(e) => return Err(ConfigError::invalid("notion_api_base_url", e.to_string())),
        }

        if self.token_v2.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ConfigError::invalid("token_v2", "must not be blank when set"));
        }

        Ok(())
    }

    /// Address the listener binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.trim().parse().map_err(|_| {
            ConfigError::invalid("host", format!("'{}' is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
