//! Document link discovery
//!
//! Manual links hide in several places on a detail page: marker attributes,
//! plain anchors, a tab that loads lazily, model popup menus, and content
//! that only appears after scrolling. Each strategy below adds what it finds
//! to one accumulator; none can remove what an earlier one found.

use crate::config::TimingConfig;
use crate::crawler::driver::{pause, ClickScope, ControlState, PageDriver};
use crate::crawler::parser::selector;
use crate::model::{DedupMode, DocumentLink};
use crate::site;
use crate::url::{resolve_document_href, resolve_manual_name};
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use url::Url;

const TAB_SCROLL_STEPS: usize = 3;
const TAB_SCROLL_PX: i64 = 300;
const PAGE_SCROLL_STEPS: usize = 3;
const PAGE_SCROLL_PX: i64 = 500;

/// Collected document candidates in encounter order
///
/// Every candidate a strategy reports is kept, exact repeats included.
/// A rescan after a click or a scroll only contributes the occurrences it
/// has beyond the previous result of the same scan.
#[derive(Debug, Default)]
pub struct DocumentAccumulator {
    links: Vec<DocumentLink>,
    last_scan: HashMap<Scan, Vec<Url>>,
}

impl DocumentAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every candidate of a scan; returns how many were added
    pub fn record(&mut self, scan: Scan, urls: Vec<Url>) -> usize {
        let added = urls.len();
        self.links.extend(urls.iter().cloned().map(DocumentLink::new));
        self.last_scan.insert(scan, urls);
        added
    }

    /// Appends what a rescan found beyond the scan's previous result
    pub fn record_growth(&mut self, scan: Scan, urls: Vec<Url>) -> usize {
        let previous = self.last_scan.get(&scan).map(Vec::as_slice).unwrap_or(&[]);
        let grown = growth(previous, &urls);
        let added = grown.len();
        self.links.extend(grown.into_iter().map(DocumentLink::new));
        self.last_scan.insert(scan, urls);
        added
    }

    /// Sets the baseline for later rescans without adding anything
    pub fn observe(&mut self, scan: Scan, urls: Vec<Url>) {
        self.last_scan.insert(scan, urls);
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_links(self) -> Vec<DocumentLink> {
        self.links
    }
}

/// Occurrences in `current` beyond those in `previous`, in `current` order
fn growth(previous: &[Url], current: &[Url]) -> Vec<Url> {
    let mut remaining: HashMap<&Url, usize> = HashMap::new();
    for url in previous {
        *remaining.entry(url).or_default() += 1;
    }

    current
        .iter()
        .filter(|url| match remaining.get_mut(*url) {
            Some(count) if *count > 0 => {
                *count -= 1;
                false
            }
            _ => true,
        })
        .cloned()
        .collect()
}

/// A snapshot scan that yields document candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scan {
    Markers,
    Anchors,
    SectionAnchors,
    PopupMenus,
}

impl Scan {
    pub fn run(self, html: &str, page_url: &Url, base: &Url) -> Vec<Url> {
        match self {
            Self::Markers => scan_manual_markers(html, page_url, base),
            Self::Anchors => scan_anchors(html, page_url, base),
            Self::SectionAnchors => scan_section_anchors(html, page_url, base),
            Self::PopupMenus => scan_popup_menus(html, page_url, base),
        }
    }
}

/// Discovery strategies, run in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Elements carrying a manual-name marker
    ManualMarkers,
    /// Every anchor pointing at a document
    PageAnchors,
    /// The "Manuals & Diagrams" tab and its lazily loaded section
    ManualsTab,
    /// Model-specific popup menus
    PopupMenus,
    /// Whole-page scrolling for lazily loaded anchors
    PageScroll,
}

pub const STRATEGIES: [Strategy; 5] = [
    Strategy::ManualMarkers,
    Strategy::PageAnchors,
    Strategy::ManualsTab,
    Strategy::PopupMenus,
    Strategy::PageScroll,
];

impl Strategy {
    /// True if the strategy only makes sense when page scripts run
    pub fn needs_rendering(&self) -> bool {
        matches!(self, Self::ManualsTab | Self::PageScroll)
    }
}

/// Scans marker elements: their href, else the marker value itself
pub fn scan_manual_markers(html: &str, page_url: &Url, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Some(sel) = selector(site::MANUAL_MARKER) else {
        return Vec::new();
    };

    document
        .select(&sel)
        .filter_map(|el| {
            let href = el.value().attr("href").filter(|h| !h.trim().is_empty());
            match href {
                Some(href) => resolve_document_href(href, page_url, base),
                None => el
                    .value()
                    .attr(site::MANUAL_MARKER_ATTR)
                    .and_then(|name| resolve_manual_name(name, base)),
            }
        })
        .collect()
}

/// Scans anchors whose href names a document
///
/// With a scope, only anchors inside the first element matching it count.
pub fn scan_anchors_in(html: &str, page_url: &Url, base: &Url, scope: Option<&str>) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Some(anchor_sel) = selector("a[href]") else {
        return Vec::new();
    };

    let hrefs = |root: ElementRef| -> Vec<Url> {
        root.select(&anchor_sel)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve_document_href(href, page_url, base))
            .collect()
    };

    match scope {
        None => hrefs(document.root_element()),
        Some(css) => selector(css)
            .and_then(|sel| document.select(&sel).next())
            .map(hrefs)
            .unwrap_or_default(),
    }
}

pub fn scan_anchors(html: &str, page_url: &Url, base: &Url) -> Vec<Url> {
    scan_anchors_in(html, page_url, base, None)
}

fn scan_section_anchors(html: &str, page_url: &Url, base: &Url) -> Vec<Url> {
    scan_anchors_in(html, page_url, base, Some(site::MANUALS_SECTION))
}

/// Scans popup menu links: both the href and any marker value
pub fn scan_popup_menus(html: &str, page_url: &Url, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let Some(sel) = selector(site::POPUP_MENU_LINKS) else {
        return Vec::new();
    };

    document
        .select(&sel)
        .flat_map(|el| {
            let from_href = el
                .value()
                .attr("href")
                .and_then(|href| resolve_document_href(href, page_url, base));
            let from_marker = el
                .value()
                .attr(site::MANUAL_MARKER_ATTR)
                .and_then(|name| resolve_manual_name(name, base));
            from_href.into_iter().chain(from_marker)
        })
        .collect()
}

/// Snapshots the page and runs one scan over it
async fn scan_page(
    driver: &mut dyn PageDriver,
    page_url: &Url,
    base: &Url,
    scan: Scan,
) -> Option<Vec<Url>> {
    let html = match driver.snapshot().await {
        Ok(html) => html,
        Err(e) => {
            tracing::debug!("Snapshot for document scan failed: {}", e);
            return None;
        }
    };

    let current = driver.current_url().cloned().unwrap_or_else(|| page_url.clone());
    Some(scan.run(&html, &current, base))
}

async fn rescan_growth(
    driver: &mut dyn PageDriver,
    page_url: &Url,
    base: &Url,
    scan: Scan,
    found: &mut DocumentAccumulator,
) -> usize {
    match scan_page(driver, page_url, base, scan).await {
        Some(urls) => found.record_growth(scan, urls),
        None => 0,
    }
}

async fn open_manuals_tab(
    driver: &mut dyn PageDriver,
    page_url: &Url,
    base: &Url,
    timing: &TimingConfig,
    found: &mut DocumentAccumulator,
) -> usize {
    if driver.probe(site::MANUALS_TAB).await != ControlState::Visible {
        return 0;
    }

    let outcome = driver.click(site::MANUALS_TAB, ClickScope::First).await;
    if !outcome.is_clicked() {
        tracing::debug!("Manuals tab not opened: {:?}", outcome);
        return 0;
    }
    pause(timing.tab_load()).await;

    let mut added = rescan_growth(driver, page_url, base, Scan::Anchors, found).await;
    added += rescan_growth(driver, page_url, base, Scan::Markers, found).await;

    if let Some(section) = scan_page(driver, page_url, base, Scan::SectionAnchors).await {
        found.observe(Scan::SectionAnchors, section);
    }
    for _ in 0..TAB_SCROLL_STEPS {
        if !driver.scroll_within(site::MANUALS_SECTION, TAB_SCROLL_PX).await {
            break;
        }
        pause(timing.scroll_pause()).await;
        added += rescan_growth(driver, page_url, base, Scan::SectionAnchors, found).await;
    }

    added
}

async fn scroll_page(
    driver: &mut dyn PageDriver,
    page_url: &Url,
    base: &Url,
    timing: &TimingConfig,
    found: &mut DocumentAccumulator,
) -> usize {
    // Anchors revealed by earlier interaction are already collected
    if let Some(anchors) = scan_page(driver, page_url, base, Scan::Anchors).await {
        found.observe(Scan::Anchors, anchors);
    }

    let mut added = 0;
    for _ in 0..PAGE_SCROLL_STEPS {
        driver.scroll_page(PAGE_SCROLL_PX).await;
        pause(timing.scroll_pause()).await;
        added += rescan_growth(driver, page_url, base, Scan::Anchors, found).await;
    }
    added
}

async fn run_strategy(
    strategy: Strategy,
    driver: &mut dyn PageDriver,
    page_url: &Url,
    base: &Url,
    timing: &TimingConfig,
    found: &mut DocumentAccumulator,
) -> usize {
    let scan = match strategy {
        Strategy::ManualMarkers => Scan::Markers,
        Strategy::PageAnchors => Scan::Anchors,
        Strategy::PopupMenus => Scan::PopupMenus,
        Strategy::ManualsTab => {
            return open_manuals_tab(driver, page_url, base, timing, found).await
        }
        Strategy::PageScroll => return scroll_page(driver, page_url, base, timing, found).await,
    };

    match scan_page(driver, page_url, base, scan).await {
        Some(urls) => found.record(scan, urls),
        None => 0,
    }
}

/// Runs every strategy against the loaded page and applies the dedup policy
pub async fn discover_documents(
    driver: &mut dyn PageDriver,
    page_url: &Url,
    base: &Url,
    mode: DedupMode,
    timing: &TimingConfig,
) -> Vec<DocumentLink> {
    let mut found = DocumentAccumulator::new();

    for strategy in STRATEGIES {
        if strategy.needs_rendering() && !driver.is_rendered() {
            continue;
        }
        let added = run_strategy(strategy, driver, page_url, base, timing, &mut found).await;
        tracing::debug!("  {:?}: {} new document link(s)", strategy, added);
    }

    let candidates = found.len();
    let links = mode.apply(found.into_links());

    if links.is_empty() {
        tracing::info!("  No PDFs found for this product");
    } else {
        tracing::info!(
            "  Found {} PDF(s) ({} candidates, {} mode)",
            links.len(),
            candidates,
            mode
        );
    }
    links
}
