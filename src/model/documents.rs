//! Document links and the dedup policy

use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// A resolved link to a downloadable document
///
/// The dedup key is `scheme://host[:port]/path`: two links that differ only
/// in query string or fragment share a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLink {
    url: Url,
    key: String,
}

impl DocumentLink {
    /// Wraps an absolute URL and computes its dedup key
    pub fn new(url: Url) -> Self {
        let key = dedup_key(&url);
        Self { url, key }
    }

    /// The full URL, query and fragment included
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The full URL as a string
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// The normalization key used by [`DedupMode::Unique`]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DocumentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

fn dedup_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

/// Operator-selected policy for collapsing document links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupMode {
    /// Keep the first link per (scheme, host, path)
    #[default]
    Unique,

    /// Keep every link in encounter order
    All,
}

impl DedupMode {
    /// Applies the policy, preserving encounter order
    pub fn apply(&self, links: Vec<DocumentLink>) -> Vec<DocumentLink> {
        match self {
            Self::All => links,
            Self::Unique => {
                let mut seen = HashSet::new();
                links
                    .into_iter()
                    .filter(|link| seen.insert(link.key.clone()))
                    .collect()
            }
        }
    }

    /// Tag printed in the summary heading
    pub fn heading_tag(&self) -> &'static str {
        match self {
            Self::Unique => "UNIQUE",
            Self::All => "ALL",
        }
    }
}

impl fmt::Display for DedupMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unique => f.write_str("unique"),
            Self::All => f.write_str("all"),
        }
    }
}
