//! HTML snapshot helpers
//!
//! This module holds the small pieces of DOM work shared by the extractors
//! and the static driver:
//! - whitespace-normalized element text
//! - static visibility checks
//! - locating controls described by [`Locator`]s

use crate::crawler::driver::{ControlState, Locator};
use scraper::{ElementRef, Html, Selector};

/// Parses a selector, logging selectors that fail to parse
pub(crate) fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            tracing::debug!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

/// Returns the element's text with whitespace runs collapsed
///
/// Text nodes are trimmed and joined with single spaces, which mirrors what
/// a browser reports as an element's visible text for typical markup.
pub fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns only the element's direct text children, normalized
pub fn own_text(element: &ElementRef) -> String {
    element
        .children()
        .filter_map(|child| child.value().as_text())
        .flat_map(|text| text.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Best guess at visibility without a layout engine
///
/// An element counts as hidden when it or an ancestor carries the `hidden`
/// attribute or an inline `display: none` / `visibility: hidden` style.
pub fn is_statically_visible(element: &ElementRef) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .all(|el| !is_hidden_by_markup(&el))
}

fn is_hidden_by_markup(element: &ElementRef) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }

    value
        .attr("style")
        .map(|style| {
            let style: String = style
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

/// Finds the elements matched by the first locator that matches anything
pub fn locate_controls<'a>(document: &'a Html, locators: &[Locator]) -> Vec<ElementRef<'a>> {
    for locator in locators {
        let Some(sel) = selector(locator.css) else {
            continue;
        };

        let matches: Vec<ElementRef<'a>> = document
            .select(&sel)
            .filter(|el| locator.matches_text(&element_text(el)))
            .collect();

        if !matches.is_empty() {
            return matches;
        }
    }

    Vec::new()
}

/// Reports whether a control is present and visible in a snapshot
pub fn control_state(html: &str, locators: &[Locator]) -> ControlState {
    let document = Html::parse_document(html);
    let controls = locate_controls(&document, locators);

    if controls.is_empty() {
        ControlState::Absent
    } else if controls.iter().any(is_statically_visible) {
        ControlState::Visible
    } else {
        ControlState::Hidden
    }
}

/// Returns true if any element in the snapshot matches `css`
pub fn has_match(html: &str, css: &str) -> bool {
    let document = Html::parse_document(html);
    selector(css)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}
