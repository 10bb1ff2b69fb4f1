//! File host allow-list.
//!
//! Every URL the shim hands to a browser or fetches itself must pass
//! [`HostAllowList::is_allowed`]. Without it the redirect and streaming
//! endpoints would forward to whatever host a record map points at.
//!
//! Rule: a host matches a listed domain when it is equal to it or ends with
//! `.` + domain. `notion.so` therefore covers `www.notion.so` and
//! `file.notion.so`, but not `evilnotion.so`.

use notion_assets_types::models::DEFAULT_ALLOWED_HOSTS;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostAllowList {
    domains: Vec<String>,
}

impl Default for HostAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_HOSTS.iter().copied())
    }
}

impl HostAllowList {
    /// Build from domain entries. Entries are trimmed and lowercased; a
    /// leading `*.` or `.` is dropped; empty entries are ignored.
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Vec::new();
        for raw in domains {
            let domain = normalize_domain(raw.as_ref());
            if !domain.is_empty() && !list.contains(&domain) {
                list.push(domain);
            }
        }
        Self { domains: list }
    }

    /// Default domains plus `extra`.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let defaults = DEFAULT_ALLOWED_HOSTS.iter().map(|d| (*d).to_string());
        let extra = extra.into_iter().map(|d| d.as_ref().to_string());
        Self::new(defaults.chain(extra))
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    /// `true` when `url` parses and its host is on the list. Never fails.
    pub fn is_allowed(&self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => self.is_allowed_host(&host),
            None => false,
        }
    }

    /// Host-only variant of [`Self::is_allowed`].
    pub fn is_allowed_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        if host.is_empty() {
            return false;
        }
        self.domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

/// Lowercased host of `url`, or `None` when unparsable or host-less.
pub fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}

/// `url` without query string or fragment, for logging signed URLs.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        },
        Err(_) => "<unparsable url>".to_string(),
    }
}

fn normalize_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("*.").unwrap_or(trimmed);
    trimmed.trim_start_matches('.').trim_end_matches('.').to_ascii_lowercase()
}
