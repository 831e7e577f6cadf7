//! Overlay dismissal
//!
//! Region prompts, cookie banners and notifications can cover the controls
//! the pipeline needs. After each rendered load every probe is tried once,
//! in order; a probe that cannot act is logged and skipped.

use crate::crawler::driver::{pause, ClickOutcome, ClickScope, Locator, PageDriver};
use std::time::Duration;

/// One kind of overlay and how to close it
#[derive(Debug, Clone, Copy)]
pub struct PopupProbe {
    /// Used in log lines
    pub name: &'static str,
    pub locators: &'static [Locator],
    pub scope: ClickScope,
}

/// What happened to one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub name: &'static str,
    pub outcome: ClickOutcome,
}

/// Runs every probe in order and reports each outcome
///
/// `pause_after` is slept after each probe that clicked something, so the
/// page can react before the next probe looks at it.
pub async fn dismiss_popups(
    driver: &mut dyn PageDriver,
    probes: &[PopupProbe],
    pause_after: Duration,
) -> Vec<ProbeReport> {
    let mut reports = Vec::with_capacity(probes.len());

    for probe in probes {
        let outcome = driver.click(probe.locators, probe.scope).await;

        match &outcome {
            ClickOutcome::Absent => {
                tracing::debug!("No {} popup", probe.name);
            }
            ClickOutcome::Clicked(count) => {
                tracing::info!("Dismissed {} popup ({} control(s))", probe.name, count);
                pause(pause_after).await;
            }
            ClickOutcome::Unclickable(reason) => {
                tracing::warn!("Could not dismiss {} popup: {}", probe.name, reason);
            }
        }

        reports.push(ProbeReport {
            name: probe.name,
            outcome,
        });
    }

    reports
}
