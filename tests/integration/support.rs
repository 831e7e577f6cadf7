//! Shared fixtures for the pipeline tests

use async_trait::async_trait;
use catalog_sweep::config::{
    Config, FetchConfig, FetchMode, OutputConfig, SiteConfig, TimingConfig,
};
use catalog_sweep::crawler::{
    control_state, has_match, ClickOutcome, ClickScope, ControlState, Locator, PageDriver,
};
use catalog_sweep::{DedupMode, FetchError};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Builds a config for a site served at `base`, writing under `root`
pub fn test_config(base: &str, mode: FetchMode, dedup: DedupMode, root: &Path) -> Config {
    Config {
        site: SiteConfig {
            base_url: base.to_string(),
            listing_url: format!("{}/trane/parts", base),
            max_pages: None,
        },
        fetch: FetchConfig {
            mode,
            max_attempts: 3,
            backoff_base_ms: 1,
            ..FetchConfig::default()
        },
        timing: TimingConfig::immediate(),
        output: OutputConfig {
            root: root.display().to_string(),
            dedup,
        },
    }
}

/// What clicking a control does to the scripted page
#[derive(Debug, Clone)]
pub enum ClickEffect {
    /// The page now shows this markup
    Replace(String),
    /// The control refuses the click
    Fail(String),
    /// The click navigates to another scripted page; like a real tab, the
    /// new address is only reported from the next snapshot on
    Follow(String),
}

/// Scroll target meaning the whole window
pub const WINDOW: &str = "window";

/// A page driver that plays back canned markup
///
/// Pages are looked up by URL on navigation. Clicks on a visible control
/// apply the next effect queued for (current URL, first locator's CSS);
/// with nothing queued the click succeeds and the page stays as it is.
/// Scrolls work the same way, keyed by the scrolled element's CSS or
/// [`WINDOW`].
#[derive(Default)]
pub struct ScriptedDriver {
    pages: HashMap<String, String>,
    effects: HashMap<(String, String), VecDeque<ClickEffect>>,
    scrolls: HashMap<(String, String), VecDeque<String>>,
    current: Option<(Url, String)>,
    followed: Option<Url>,
    /// CSS of the first locator of every click that found a visible control
    pub clicked: Vec<String>,
    /// Every URL navigated to
    pub navigations: Vec<String>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn on_click(mut self, url: &str, css: &str, effect: ClickEffect) -> Self {
        self.effects
            .entry((url.to_string(), css.to_string()))
            .or_default()
            .push_back(effect);
        self
    }

    /// Queues the markup shown after the next scroll of `target`
    pub fn on_scroll(mut self, url: &str, target: &str, html: &str) -> Self {
        self.scrolls
            .entry((url.to_string(), target.to_string()))
            .or_default()
            .push_back(html.to_string());
        self
    }

    fn apply_scroll(&mut self, target: &str) {
        let Some((url, _)) = self.current.clone() else {
            return;
        };
        if let Some(next) = self
            .scrolls
            .get_mut(&(url.to_string(), target.to_string()))
            .and_then(VecDeque::pop_front)
        {
            self.current = Some((url, next));
        }
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    fn is_rendered(&self) -> bool {
        true
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|(url, _)| url)
    }

    async fn navigate(&mut self, url: &Url) -> Result<(), FetchError> {
        self.navigations.push(url.to_string());
        self.followed = None;
        match self.pages.get(url.as_str()) {
            Some(html) => {
                self.current = Some((url.clone(), html.clone()));
                Ok(())
            }
            None => Err(FetchError::Permanent {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            }),
        }
    }

    async fn snapshot(&mut self) -> Result<String, FetchError> {
        if let (Some(landed), Some((_, html))) = (self.followed.take(), self.current.clone()) {
            self.current = Some((landed, html));
        }
        self.current
            .as_ref()
            .map(|(_, html)| html.clone())
            .ok_or_else(|| FetchError::Driver {
                url: String::new(),
                message: "no page loaded".to_string(),
            })
    }

    async fn wait_for(&mut self, css: &str, _timeout: Duration) -> bool {
        self.current
            .as_ref()
            .is_some_and(|(_, html)| has_match(html, css))
    }

    async fn probe(&mut self, locators: &[Locator]) -> ControlState {
        self.current
            .as_ref()
            .map(|(_, html)| control_state(html, locators))
            .unwrap_or(ControlState::Absent)
    }

    async fn click(&mut self, locators: &[Locator], _scope: ClickScope) -> ClickOutcome {
        let Some((url, html)) = self.current.clone() else {
            return ClickOutcome::Absent;
        };

        match control_state(&html, locators) {
            ControlState::Absent => return ClickOutcome::Absent,
            ControlState::Hidden => {
                return ClickOutcome::Unclickable("control is hidden".to_string())
            }
            ControlState::Visible => {}
        }

        let css = locators[0].css.to_string();
        self.clicked.push(css.clone());

        let effect = self
            .effects
            .get_mut(&(url.to_string(), css))
            .and_then(VecDeque::pop_front);

        match effect {
            Some(ClickEffect::Replace(next)) => {
                self.current = Some((url, next));
                ClickOutcome::Clicked(1)
            }
            Some(ClickEffect::Fail(reason)) => ClickOutcome::Unclickable(reason),
            Some(ClickEffect::Follow(target)) => {
                let html = self.pages.get(&target).cloned().unwrap_or_default();
                self.current = Some((url, html));
                self.followed = Url::parse(&target).ok();
                ClickOutcome::Clicked(1)
            }
            None => ClickOutcome::Clicked(1),
        }
    }

    async fn scroll_page(&mut self, _dy: i64) {
        self.apply_scroll(WINDOW);
    }

    async fn scroll_within(&mut self, css: &str, _dy: i64) -> bool {
        if !self.wait_for(css, Duration::ZERO).await {
            return false;
        }
        self.apply_scroll(css);
        true
    }
}

/// Markup for one listing tile
pub fn tile(name: &str, href: &str) -> String {
    format!(
        r#"<li class="js-product-item" data-name="{}"><a href="{}">{}</a></li>"#,
        name, href, name
    )
}

/// Wraps listing tiles (and optional trailing markup) in a page
pub fn listing_page(tiles: &[String], extra: &str) -> String {
    format!(
        "<html><body><ul>{}</ul>{}</body></html>",
        tiles.concat(),
        extra
    )
}

/// A detail page with the given info rows and extra body markup
pub fn detail_page(rows: &[(&str, &str)], extra: &str) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                r#"<div class="product__row"><div class="product__label">{}</div><div class="product__cell product__val">{}</div></div>"#,
                label, value
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="product-info">{}</div>{}</body></html>"#,
        rows, extra
    )
}
