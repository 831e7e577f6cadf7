//! Listing traversal
//!
//! Loads the catalog listing, collects product references from every page
//! (or every "load more" batch), and decides after each page whether to
//! advance. The decision is a pure function of what was observed, so the
//! termination rules can be tested without a page.

use crate::config::TimingConfig;
use crate::crawler::driver::{load_page, pause, ClickScope, ControlState, PageDriver};
use crate::crawler::parser::{element_text, is_statically_visible, selector};
use crate::model::ProductReference;
use crate::site;
use crate::url::resolve_link;
use scraper::Html;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Why traversal ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The current page shows no product elements
    NoProducts,
    /// Advancing produced nothing that was not already collected
    NoNewProducts,
    /// The configured page bound was reached
    MaxPagesReached,
    /// There is no visible next-page control
    NoNextControl,
    /// The next-page control was there but could not be activated
    NextControlFailed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoProducts => "no products on page",
            Self::NoNewProducts => "no new products after advancing",
            Self::MaxPagesReached => "reached max pages limit",
            Self::NoNextControl => "no more pages found",
            Self::NextControlFailed => "next-page control could not be activated",
        };
        f.write_str(text)
    }
}

/// What one iteration saw on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageObservation {
    /// Product elements extracted from the page
    pub products: usize,
    /// Of those, URLs not collected on earlier pages
    pub new_products: usize,
    pub next_control: ControlState,
}

/// Decision taken after observing a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advance,
    Stop(StopReason),
}

/// Decides whether to advance past the current page
///
/// Checks run in a fixed order and the first one that applies wins:
/// no products, nothing new, page bound, missing or hidden control.
pub fn next_step(
    pages_visited: u32,
    max_pages: Option<u32>,
    observation: &PageObservation,
) -> Step {
    if observation.products == 0 {
        return Step::Stop(StopReason::NoProducts);
    }

    if observation.new_products == 0 {
        return Step::Stop(StopReason::NoNewProducts);
    }

    if max_pages.is_some_and(|max| pages_visited >= max) {
        return Step::Stop(StopReason::MaxPagesReached);
    }

    if observation.next_control != ControlState::Visible {
        return Step::Stop(StopReason::NoNextControl);
    }

    Step::Advance
}

/// Accumulated state of one traversal
#[derive(Debug, Default)]
pub struct Traversal {
    pages_visited: u32,
    collected: Vec<ProductReference>,
    seen_urls: HashSet<Url>,
}

impl Traversal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    /// Records a page's products and returns how many URLs were new
    pub fn record_page(&mut self, products: Vec<ProductReference>) -> usize {
        self.pages_visited += 1;

        let mut new_products = 0;
        for product in products {
            if self.seen_urls.insert(product.detail_url.clone()) {
                new_products += 1;
            }
            self.collected.push(product);
        }
        new_products
    }

    /// Final result: unique URLs with non-empty names, first-seen order
    pub fn finish(self) -> Vec<ProductReference> {
        dedup_references(self.collected)
    }
}

/// Deduplicates references by detail URL
///
/// The first reference with a non-empty name claims its URL; references
/// with empty names are dropped and claim nothing.
pub fn dedup_references(references: Vec<ProductReference>) -> Vec<ProductReference> {
    let mut seen = HashSet::new();
    references
        .into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .filter(|r| seen.insert(r.detail_url.clone()))
        .collect()
}

/// Extracts product references from a listing snapshot
///
/// The name comes from the element's `data-name`, falling back to the text
/// of its first anchor; the URL is that anchor's href. Elements without a
/// usable anchor are skipped. Names may be empty here.
pub fn extract_products(html: &str, page_url: &Url, base: &Url) -> Vec<ProductReference> {
    let (Some(item_sel), Some(anchor_sel)) = (selector(site::PRODUCT_ITEM), selector("a")) else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    document
        .select(&item_sel)
        .filter(is_statically_visible)
        .filter_map(|item| {
            let anchor = item.select(&anchor_sel).next()?;
            let href = anchor.value().attr("href")?;
            let detail_url = resolve_link(href, page_url, base)?;

            let name = item
                .value()
                .attr(site::PRODUCT_NAME_ATTR)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| element_text(&anchor));

            Some(ProductReference::new(name, detail_url))
        })
        .collect()
}

/// Walks the listing starting at `listing_url`
///
/// Load failures and control failures end the walk; whatever was collected
/// up to that point is returned.
pub async fn traverse(
    driver: &mut dyn PageDriver,
    listing_url: &Url,
    base: &Url,
    max_pages: Option<u32>,
    timing: &TimingConfig,
) -> Vec<ProductReference> {
    tracing::info!("Fetching product listing from: {}", listing_url);

    if let Err(e) = load_page(driver, listing_url, timing).await {
        tracing::warn!("Failed to load listing page: {}", e);
        return Vec::new();
    }

    let mut traversal = Traversal::new();

    let reason = loop {
        let page_number = traversal.pages_visited() + 1;
        tracing::info!("Extracting products from page {}...", page_number);

        let products = if driver.wait_for(site::PRODUCT_ITEM, timing.product_wait()).await {
            match driver.snapshot().await {
                Ok(html) => {
                    let page_url = driver
                        .current_url()
                        .cloned()
                        .unwrap_or_else(|| listing_url.clone());
                    extract_products(&html, &page_url, base)
                }
                Err(e) => {
                    tracing::warn!("Failed to read listing page {}: {}", page_number, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let found = products.len();
        let new_products = traversal.record_page(products);
        tracing::info!(
            "  Found {} products on page {} ({} new)",
            found,
            page_number,
            new_products
        );

        let observation = PageObservation {
            products: found,
            new_products,
            next_control: driver.probe(site::NEXT_PAGE).await,
        };

        match next_step(traversal.pages_visited(), max_pages, &observation) {
            Step::Stop(reason) => break reason,
            Step::Advance => {
                let outcome = driver.click(site::NEXT_PAGE, ClickScope::First).await;
                if !outcome.is_clicked() {
                    tracing::debug!("Next-page activation: {:?}", outcome);
                    break StopReason::NextControlFailed;
                }
                pause(timing.page_load()).await;
            }
        }
    };

    let pages = traversal.pages_visited();
    let references = traversal.finish();
    tracing::info!(
        "Listing finished ({}): {} unique products across {} page(s)",
        reason,
        references.len(),
        pages
    );
    references
}
