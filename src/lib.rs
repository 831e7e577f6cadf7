//! Catalog-Sweep: a resilient product catalog harvester
//!
//! This crate walks a commerce site's product listing, visits every product
//! detail page, extracts a fixed set of attributes plus links to PDF manuals,
//! and writes one folder per product containing a text summary and the
//! downloaded manuals.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod site;
pub mod url;

use thiserror::Error;

/// Main error type for Catalog-Sweep operations
///
/// Only setup failures surface as this type. Per-page and per-download
/// failures are logged and skipped by the component that owns them.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Failed to create output directory {path}: {source}")]
    OutputRoot {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors produced while loading a page
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Timeouts, connection failures, 5xx and 429 responses, after every
    /// attempt was used up
    #[error("Giving up on {url} after {attempts} attempt(s): {last_error}")]
    Transient {
        url: String,
        attempts: u32,
        last_error: String,
    },

    /// Failures that retrying cannot fix (4xx other than 429, bad requests)
    #[error("Permanent failure for {url}: {reason}")]
    Permanent { url: String, reason: String },

    /// The page driver could not serve the request
    #[error("Page driver error for {url}: {message}")]
    Driver { url: String, message: String },
}

/// Errors produced while downloading a document
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for Catalog-Sweep operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{scrape, Coordinator, RunOutcome};
pub use model::{AttributeRecord, DedupMode, DocumentLink, Field, ProductDetails, ProductReference};
