//! Page driver backed by plain HTTP requests
//!
//! Sees only server-rendered markup. Clicking an anchor with a real href
//! follows it, which is enough for classic pagination links; scripted
//! controls cannot be activated.

use crate::crawler::driver::{ClickOutcome, ClickScope, ControlState, Locator, PageDriver};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::{control_state, has_match, is_statically_visible, locate_controls};
use crate::url::resolve_link;
use crate::FetchError;
use async_trait::async_trait;
use scraper::Html;
use std::time::Duration;
use url::Url;

/// The page most recently loaded
#[derive(Debug, Clone)]
struct Loaded {
    url: Url,
    html: String,
}

pub struct StaticDriver {
    fetcher: Fetcher,
    current: Option<Loaded>,
}

impl StaticDriver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            current: None,
        }
    }

    /// Works out where clicking the control would lead
    fn click_target(&self, locators: &[Locator]) -> Result<Option<Url>, String> {
        let Some(loaded) = &self.current else {
            return Ok(None);
        };

        let document = Html::parse_document(&loaded.html);
        let controls = locate_controls(&document, locators);
        if controls.is_empty() {
            return Ok(None);
        }

        let control = controls
            .iter()
            .find(|el| is_statically_visible(el))
            .ok_or_else(|| "control is hidden".to_string())?;

        if control.value().name() != "a" {
            return Err(format!(
                "<{}> needs scripts to activate",
                control.value().name()
            ));
        }

        control
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, &loaded.url, &loaded.url))
            .map(Some)
            .ok_or_else(|| "anchor has no navigable href".to_string())
    }
}

#[async_trait]
impl PageDriver for StaticDriver {
    fn is_rendered(&self) -> bool {
        false
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|loaded| &loaded.url)
    }

    async fn navigate(&mut self, url: &Url) -> Result<(), FetchError> {
        let page = self.fetcher.fetch(url).await?;
        tracing::debug!("Loaded {} ({} bytes)", page.final_url, page.body.len());
        self.current = Some(Loaded {
            url: page.final_url,
            html: page.body,
        });
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<String, FetchError> {
        self.current
            .as_ref()
            .map(|loaded| loaded.html.clone())
            .ok_or_else(|| FetchError::Driver {
                url: String::new(),
                message: "no page loaded".to_string(),
            })
    }

    async fn wait_for(&mut self, css: &str, _timeout: Duration) -> bool {
        // Static markup never changes, so one look is final
        self.current
            .as_ref()
            .map(|loaded| has_match(&loaded.html, css))
            .unwrap_or(false)
    }

    async fn probe(&mut self, locators: &[Locator]) -> ControlState {
        self.current
            .as_ref()
            .map(|loaded| control_state(&loaded.html, locators))
            .unwrap_or(ControlState::Absent)
    }

    async fn click(&mut self, locators: &[Locator], _scope: ClickScope) -> ClickOutcome {
        let target = match self.click_target(locators) {
            Ok(Some(target)) => target,
            Ok(None) => return ClickOutcome::Absent,
            Err(reason) => return ClickOutcome::Unclickable(reason),
        };

        match self.navigate(&target).await {
            Ok(()) => ClickOutcome::Clicked(1),
            Err(e) => ClickOutcome::Unclickable(e.to_string()),
        }
    }

    async fn scroll_page(&mut self, _dy: i64) {}

    async fn scroll_within(&mut self, css: &str, _dy: i64) -> bool {
        self.wait_for(css, Duration::ZERO).await
    }
}
