//! Page driver backed by a headless Chromium tab
//!
//! `headless_chrome` is synchronous, so every call into the tab runs on the
//! blocking thread pool. Control lookups and clicks are done in page script:
//! one round trip evaluates the locators in order and reports back as JSON.

use crate::config::FetchConfig;
use crate::crawler::driver::{
    pause, ClickOutcome, ClickScope, ControlState, Locator, PageDriver,
};
use crate::crawler::retry::{FailureKind, RetryPolicy};
use crate::{FetchError, ScrapeError};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

const WINDOW_SIZE: (u32, u32) = (1920, 1080);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const POLL_INTERVAL: Duration = Duration::from_millis(250);
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Shared page-script helpers; `LOCATORS` and `MODE` are substituted in
const CONTROL_SCRIPT: &str = r#"
(() => {
  const locators = LOCATORS;
  const mode = MODE;
  const shown = el => {
    const rect = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return rect.width > 0 && rect.height > 0
      && style.visibility !== 'hidden' && style.display !== 'none';
  };
  const wanted = (el, l) => {
    const text = (el.innerText || el.textContent || '').toLowerCase();
    return (l.any.length === 0 || l.any.some(w => text.includes(w)))
      && l.all.every(w => text.includes(w))
      && (l.exact.length === 0 || l.exact.includes(text.trim()));
  };
  for (const l of locators) {
    let found;
    try { found = Array.from(document.querySelectorAll(l.css)); } catch (e) { continue; }
    found = found.filter(el => wanted(el, l));
    if (found.length === 0) continue;
    const visible = found.filter(shown);
    const report = { found: found.length, visible: visible.length, clicked: 0, error: null };
    if (mode === 'probe') return JSON.stringify(report);
    if (visible.length === 0) { report.error = 'control is hidden'; return JSON.stringify(report); }
    const targets = mode === 'first' ? visible.slice(0, 1) : visible;
    for (const el of targets) {
      try {
        el.scrollIntoView({ block: 'center' });
        el.click();
        report.clicked += 1;
      } catch (e) {
        report.error = String(e);
      }
    }
    return JSON.stringify(report);
  }
  return JSON.stringify({ found: 0, visible: 0, clicked: 0, error: null });
})()
"#;

/// What the control script saw
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
struct ControlReport {
    found: usize,
    visible: usize,
    clicked: usize,
    error: Option<String>,
}

impl ControlReport {
    fn state(&self) -> ControlState {
        if self.found == 0 {
            ControlState::Absent
        } else if self.visible == 0 {
            ControlState::Hidden
        } else {
            ControlState::Visible
        }
    }

    fn outcome(self) -> ClickOutcome {
        if self.found == 0 {
            ClickOutcome::Absent
        } else if self.clicked > 0 {
            ClickOutcome::Clicked(self.clicked)
        } else {
            ClickOutcome::Unclickable(
                self.error
                    .unwrap_or_else(|| "control is hidden".to_string()),
            )
        }
    }
}

fn control_script(locators: &[Locator], mode: &str) -> String {
    let locators: Vec<serde_json::Value> = locators
        .iter()
        .map(|l| {
            serde_json::json!({
                "css": l.css,
                "any": l.any_text,
                "all": l.all_text,
                "exact": l.exact_text,
            })
        })
        .collect();

    CONTROL_SCRIPT
        .replace("LOCATORS", &serde_json::Value::Array(locators).to_string())
        .replace("MODE", &serde_json::Value::from(mode).to_string())
}

fn exists_script(css: &str) -> String {
    format!(
        "(() => {{ try {{ return JSON.stringify(!!document.querySelector({})); }} \
         catch (e) {{ return 'false'; }} }})()",
        serde_json::Value::from(css)
    )
}

fn scroll_within_script(css: &str, dy: i64) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); \
         if (!el) return 'false'; el.scrollTop += {}; return 'true'; }})()",
        serde_json::Value::from(css),
        dy
    )
}

/// Browser-rendered page session
pub struct ChromeDriver {
    // Keeps the browser process alive for as long as the tab is used
    _browser: Browser,
    tab: Arc<Tab>,
    retry: RetryPolicy,
    current: Option<Url>,
}

impl ChromeDriver {
    /// Starts Chromium and opens the tab used for the whole run
    pub async fn launch(config: &FetchConfig) -> Result<Self, ScrapeError> {
        let headless = config.headless;
        let user_agent = config.user_agent.clone();
        let timeout = config.timeout();

        let (browser, tab) = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
            let options = LaunchOptions {
                headless,
                sandbox: false,
                window_size: Some(WINDOW_SIZE),
                idle_browser_timeout: IDLE_TIMEOUT,
                args: vec![
                    OsStr::new("--disable-blink-features=AutomationControlled"),
                    OsStr::new("--disable-dev-shm-usage"),
                ],
                ..Default::default()
            };

            let browser = Browser::new(options)?;
            let tab = browser.new_tab()?;
            // Stealth mode installs its own user agent, so ours goes on after it
            tab.enable_stealth_mode()?;
            tab.set_user_agent(&user_agent, Some(ACCEPT_LANGUAGE), None)?;
            tab.set_default_timeout(timeout);
            Ok((browser, tab))
        })
        .await
        .map_err(|e| ScrapeError::Browser(e.to_string()))?
        .map_err(|e| ScrapeError::Browser(e.to_string()))?;

        tracing::info!("Browser started (headless: {})", headless);

        Ok(Self {
            _browser: browser,
            tab,
            retry: RetryPolicy::new(config.max_attempts, config.backoff_base()),
            current: None,
        })
    }

    /// Runs a blocking tab operation off the async runtime
    async fn run<T, F>(&self, op: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || op(&tab)).await?
    }

    /// Evaluates a script that returns a JSON string and decodes it
    async fn evaluate_json<T>(&self, script: String) -> anyhow::Result<T>
    where
        T: for<'de> Deserialize<'de> + Send + 'static,
    {
        self.run(move |tab| {
            let result = tab.evaluate(&script, false)?;
            let text = result
                .value
                .as_ref()
                .and_then(|v| v.as_str())
                .ok_or_else(|| anyhow::anyhow!("script returned no string"))?;
            Ok(serde_json::from_str(text)?)
        })
        .await
    }

    fn adopt_url(&mut self, raw: &str) {
        if let Ok(url) = Url::parse(raw) {
            self.current = Some(url);
        }
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    fn is_rendered(&self) -> bool {
        true
    }

    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref()
    }

    async fn navigate(&mut self, url: &Url) -> Result<(), FetchError> {
        let mut attempt = 1;

        loop {
            let target = url.to_string();
            let result = self
                .run(move |tab| {
                    tab.navigate_to(&target)?;
                    tab.wait_until_navigated()?;
                    Ok(())
                })
                .await;

            match result {
                Ok(()) => {
                    self.current = Some(url.clone());
                    let landed = self.tab.get_url();
                    self.adopt_url(&landed);
                    return Ok(());
                }
                Err(e) => match self.retry.next_delay(FailureKind::Transient, attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            "Attempt {}/{} to load {} failed: {}; retrying in {:?}",
                            attempt,
                            self.retry.max_attempts(),
                            url,
                            e,
                            delay
                        );
                        pause(delay).await;
                        attempt += 1;
                    }
                    None => {
                        return Err(FetchError::Transient {
                            url: url.to_string(),
                            attempts: attempt,
                            last_error: e.to_string(),
                        });
                    }
                },
            }
        }
    }

    async fn snapshot(&mut self) -> Result<String, FetchError> {
        // A scripted click may have navigated since the last look
        let result = self
            .run(|tab| Ok((tab.get_content()?, tab.get_url())))
            .await;

        match result {
            Ok((html, url)) => {
                self.adopt_url(&url);
                Ok(html)
            }
            Err(e) => Err(FetchError::Driver {
                url: self
                    .current
                    .as_ref()
                    .map(Url::to_string)
                    .unwrap_or_default(),
                message: e.to_string(),
            }),
        }
    }

    async fn wait_for(&mut self, css: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            match self.evaluate_json::<bool>(exists_script(css)).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => tracing::debug!("Waiting for '{}': {}", css, e),
            }

            if Instant::now() >= deadline {
                return false;
            }
            pause(POLL_INTERVAL).await;
        }
    }

    async fn probe(&mut self, locators: &[Locator]) -> ControlState {
        match self
            .evaluate_json::<ControlReport>(control_script(locators, "probe"))
            .await
        {
            Ok(report) => report.state(),
            Err(e) => {
                tracing::debug!("Control probe failed: {}", e);
                ControlState::Absent
            }
        }
    }

    async fn click(&mut self, locators: &[Locator], scope: ClickScope) -> ClickOutcome {
        let mode = match scope {
            ClickScope::First => "first",
            ClickScope::AllVisible => "all",
        };

        match self
            .evaluate_json::<ControlReport>(control_script(locators, mode))
            .await
        {
            Ok(report) => report.outcome(),
            Err(e) => ClickOutcome::Unclickable(e.to_string()),
        }
    }

    async fn scroll_page(&mut self, dy: i64) {
        let script = format!("window.scrollBy(0, {});", dy);
        if let Err(e) = self.run(move |tab| tab.evaluate(&script, false).map(|_| ())).await {
            tracing::debug!("Scroll failed: {}", e);
        }
    }

    async fn scroll_within(&mut self, css: &str, dy: i64) -> bool {
        self.evaluate_json::<bool>(scroll_within_script(css, dy))
            .await
            .unwrap_or(false)
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        tracing::info!("Browser closed");
    }
}
