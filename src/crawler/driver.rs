//! Page driver abstraction
//!
//! Everything that touches a live page goes through [`PageDriver`]: loading
//! a URL, taking an HTML snapshot, waiting for elements, clicking controls and
//! scrolling. Extraction itself works on snapshots, so it never depends on
//! which driver produced them.

use crate::config::TimingConfig;
use crate::crawler::popups::{dismiss_popups, ProbeReport};
use crate::site;
use crate::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Describes a page control by CSS selector and optional text
///
/// Text words are lowercase and matched case-insensitively against the
/// element's text. `any_text` needs one word to match, `all_text` needs every
/// word to match, `exact_text` needs the whole trimmed text to equal one
/// word; empty lists match anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Locator {
    pub css: &'static str,
    pub any_text: &'static [&'static str],
    pub all_text: &'static [&'static str],
    pub exact_text: &'static [&'static str],
}

impl Locator {
    /// A locator matching every element selected by `css`
    pub const fn css(css: &'static str) -> Self {
        Self {
            css,
            any_text: &[],
            all_text: &[],
            exact_text: &[],
        }
    }

    /// Restricts matches to elements mentioning at least one of `words`
    pub const fn any_text(self, words: &'static [&'static str]) -> Self {
        Self {
            any_text: words,
            ..self
        }
    }

    /// Restricts matches to elements mentioning all of `words`
    pub const fn all_text(self, words: &'static [&'static str]) -> Self {
        Self {
            all_text: words,
            ..self
        }
    }

    /// Restricts matches to elements whose whole text is one of `words`
    pub const fn exact_text(self, words: &'static [&'static str]) -> Self {
        Self {
            exact_text: words,
            ..self
        }
    }

    /// Checks an element's text against the word lists
    pub fn matches_text(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        let any = self.any_text.is_empty() || self.any_text.iter().any(|w| text.contains(w));
        let all = self.all_text.iter().all(|w| text.contains(w));
        let trimmed = text.trim();
        let exact = self.exact_text.is_empty() || self.exact_text.iter().any(|w| *w == trimmed);
        any && all && exact
    }
}

/// Presence of a control on the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    /// No element matches
    Absent,
    /// Matching elements exist but none is visible
    Hidden,
    /// At least one matching element is visible
    Visible,
}

/// Which visible matches a click applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickScope {
    /// Only the first visible match
    First,
    /// Every visible match
    AllVisible,
}

/// Result of a best-effort click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No element matched; nothing happened
    Absent,
    /// This many elements were activated
    Clicked(usize),
    /// The control is there but could not be activated
    Unclickable(String),
}

impl ClickOutcome {
    pub fn is_clicked(&self) -> bool {
        matches!(self, Self::Clicked(n) if *n > 0)
    }
}

/// A page session, used strictly sequentially
///
/// A driver owns whatever resource backs it (an HTTP client or a browser
/// tab) for its whole lifetime and releases it on drop.
#[async_trait]
pub trait PageDriver: Send {
    /// True if page scripts run (popups appear, clicks and scrolls matter)
    fn is_rendered(&self) -> bool;

    /// URL of the page currently loaded, after redirects
    ///
    /// A click that navigates is reflected here by the next snapshot at the
    /// latest; callers resolving links read it after taking one.
    fn current_url(&self) -> Option<&Url>;

    /// Loads a URL, retrying transient failures
    async fn navigate(&mut self, url: &Url) -> Result<(), FetchError>;

    /// Returns the current DOM as HTML
    async fn snapshot(&mut self) -> Result<String, FetchError>;

    /// Waits up to `timeout` for an element matching `css`
    async fn wait_for(&mut self, css: &str, timeout: Duration) -> bool;

    /// Reports whether a control is present and visible
    ///
    /// Locators are tried in order; the first one matching any element decides.
    async fn probe(&mut self, locators: &[Locator]) -> ControlState;

    /// Activates a control; locators are tried as in [`PageDriver::probe`]
    async fn click(&mut self, locators: &[Locator], scope: ClickScope) -> ClickOutcome;

    /// Scrolls the window vertically by `dy` pixels
    async fn scroll_page(&mut self, dy: i64);

    /// Scrolls the first element matching `css`; false if there is none
    async fn scroll_within(&mut self, css: &str, dy: i64) -> bool;
}

/// Loads a page the way every component expects to find it
///
/// Navigates (with retries inside the driver), then on rendered drivers waits
/// for scripts to settle and dismisses popups. Popup failures never fail the
/// load; they are returned for inspection and already logged.
pub async fn load_page(
    driver: &mut dyn PageDriver,
    url: &Url,
    timing: &TimingConfig,
) -> Result<Vec<ProbeReport>, FetchError> {
    driver.navigate(url).await?;

    if !driver.is_rendered() {
        return Ok(Vec::new());
    }

    pause(timing.settle()).await;
    Ok(dismiss_popups(driver, &site::POPUP_PROBES, timing.popup_pause()).await)
}

/// Sleeps unless the duration is zero
pub(crate) async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
