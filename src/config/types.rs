use crate::model::DedupMode;
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Main configuration structure for Catalog-Sweep
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Target site configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Origin used to resolve root-relative and protocol-relative links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Catalog listing page where traversal starts
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Maximum number of listing pages to visit (unbounded when absent)
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

impl SiteConfig {
    /// Parses the base URL
    pub fn base(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("base-url '{}': {}", self.base_url, e)))
    }

    /// Parses the listing URL
    pub fn listing(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.listing_url).map_err(|e| {
            ConfigError::InvalidUrl(format!("listing-url '{}': {}", self.listing_url, e))
        })
    }
}

/// How pages are loaded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Headless Chromium; runs page scripts, dismisses popups, clicks controls
    #[default]
    Browser,

    /// Plain HTTP requests; only server-rendered markup is seen
    Static,
}

/// Request behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub mode: FetchMode,

    /// Browser identification sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout for pages (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Per-request timeout for document downloads (seconds)
    #[serde(rename = "download-timeout-secs")]
    pub download_timeout_secs: u64,

    /// Attempts per request, including the first
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Run the browser without a window
    pub headless: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::Browser,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_secs: 30,
            download_timeout_secs: 60,
            max_attempts: 3,
            backoff_base_ms: 1000,
            headless: true,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}

/// Pauses and bounded waits, all in milliseconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Pause after navigation for page scripts to settle
    pub settle: u64,

    /// Pause after each dismissed popup
    #[serde(rename = "popup-pause")]
    pub popup_pause: u64,

    /// Bound on waiting for product elements on a listing page
    #[serde(rename = "product-wait")]
    pub product_wait: u64,

    /// Bound on waiting for the product info block on a detail page
    #[serde(rename = "detail-wait")]
    pub detail_wait: u64,

    /// Pause after activating the next-page control
    #[serde(rename = "page-load")]
    pub page_load: u64,

    /// Pause after opening the manuals tab
    #[serde(rename = "tab-load")]
    pub tab_load: u64,

    /// Pause after each scroll step
    #[serde(rename = "scroll-pause")]
    pub scroll_pause: u64,

    /// Politeness delay between products
    pub politeness: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            settle: 3000,
            popup_pause: 1000,
            product_wait: 20_000,
            detail_wait: 10_000,
            page_load: 3000,
            tab_load: 4000,
            scroll_pause: 1000,
            politeness: 2000,
        }
    }
}

impl TimingConfig {
    /// Zero pauses with short waits, for tests and local fixtures
    pub fn immediate() -> Self {
        Self {
            settle: 0,
            popup_pause: 0,
            product_wait: 50,
            detail_wait: 50,
            page_load: 0,
            tab_load: 0,
            scroll_pause: 0,
            politeness: 0,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle)
    }

    pub fn popup_pause(&self) -> Duration {
        Duration::from_millis(self.popup_pause)
    }

    pub fn product_wait(&self) -> Duration {
        Duration::from_millis(self.product_wait)
    }

    pub fn detail_wait(&self) -> Duration {
        Duration::from_millis(self.detail_wait)
    }

    pub fn page_load(&self) -> Duration {
        Duration::from_millis(self.page_load)
    }

    pub fn tab_load(&self) -> Duration {
        Duration::from_millis(self.tab_load)
    }

    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause)
    }

    pub fn politeness(&self) -> Duration {
        Duration::from_millis(self.politeness)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one folder per product
    pub root: String,

    /// How duplicate document links are collapsed
    pub dedup: DedupMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: "trane_parts".to_string(),
            dedup: DedupMode::Unique,
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_pages: Option<u32>,
    pub dedup: Option<DedupMode>,
    pub mode: Option<FetchMode>,
    pub output_root: Option<String>,
}

impl Config {
    /// Applies command-line overrides on top of the loaded file
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(max_pages) = overrides.max_pages {
            self.site.max_pages = Some(max_pages);
        }
        if let Some(dedup) = overrides.dedup {
            self.output.dedup = dedup;
        }
        if let Some(mode) = overrides.mode {
            self.fetch.mode = mode;
        }
        if let Some(root) = overrides.output_root {
            self.output.root = root;
        }
        self
    }
}
