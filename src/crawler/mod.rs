//! Crawler module for page loading and product extraction
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry logic
//! - Page drivers (plain HTTP or headless Chromium)
//! - Popup dismissal
//! - Listing traversal and detail extraction
//! - Overall run coordination

mod browser;
mod coordinator;
mod detail;
mod documents;
mod driver;
mod fetcher;
mod listing;
mod parser;
mod popups;
mod retry;
mod static_driver;

pub use browser::ChromeDriver;
pub use coordinator::{Coordinator, RunOutcome};
pub use detail::{extract_attributes, extract_details};
pub use documents::{
    discover_documents, scan_anchors, scan_anchors_in, scan_manual_markers, scan_popup_menus,
    DocumentAccumulator, Scan, Strategy, STRATEGIES,
};
pub use driver::{load_page, ClickOutcome, ClickScope, ControlState, Locator, PageDriver};
pub use fetcher::{build_http_client, Fetcher, Page};
pub use listing::{
    dedup_references, extract_products, next_step, traverse, PageObservation, Step, StopReason,
    Traversal,
};
pub use parser::{control_state, element_text, has_match};
pub use popups::{dismiss_popups, PopupProbe, ProbeReport};
pub use retry::{classify_status, FailureKind, RetryPolicy};
pub use static_driver::StaticDriver;

use crate::config::Config;
use crate::ScrapeError;

/// Runs a complete scrape
///
/// This is the main entry point for starting a run. It will:
/// 1. Build the HTTP client and the page driver for the configured mode
/// 2. Traverse the product listing
/// 3. Extract details and documents for each product
/// 4. Write one artifact folder per product
///
/// The page driver is released when this future completes or is dropped.
///
/// # Example
///
/// ```no_run
/// use catalog_sweep::config::load_config;
/// use catalog_sweep::crawler::scrape;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("sweep.toml"))?;
/// scrape(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn scrape(config: Config) -> Result<RunOutcome, ScrapeError> {
    let mut coordinator = Coordinator::new(config).await?;
    coordinator.run().await
}
