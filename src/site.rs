//! Markup conventions of the target site
//!
//! Every selector the pipeline relies on lives here, so a markup change on
//! the site is a one-file update.

use crate::crawler::{ClickScope, Locator, PopupProbe};

/// Product tiles on a listing page
pub const PRODUCT_ITEM: &str = "li.js-product-item, .product-item";

/// Attribute carrying a tile's product name
pub const PRODUCT_NAME_ATTR: &str = "data-name";

/// Next-page / load-more control, in preference order
pub const NEXT_PAGE: &[Locator] = &[
    Locator::css("button[class*='js-link-paging'], a[class*='next']"),
    Locator::css("button").any_text(&["load more", "next"]),
];

/// Block that appears once a detail page has rendered
pub const DETAIL_READY: &str = ".product-info, .product-block";

/// A label/value row layout inside the product info block
#[derive(Debug, Clone, Copy)]
pub struct RowLayout {
    pub row: &'static str,
    pub label: &'static str,
    pub value: &'static str,
}

/// Attribute row layouts, tried in order
pub const ROW_LAYOUTS: &[RowLayout] = &[
    RowLayout {
        row: ".product-info .product__row",
        label: ".product__label",
        value: ".product__val",
    },
    RowLayout {
        row: "[class*='spec'] tr",
        label: "th",
        value: "td",
    },
];

/// Element carrying the machine-readable list price
pub const PRICE_DATA: &str = "[data-listprice]";

/// Attribute holding the machine-readable list price
pub const PRICE_DATA_ATTR: &str = "data-listprice";

/// Elements showing a price as text
pub const PRICE_TEXT: &str = ".js-product-listPrice, .price-vat";

/// Text marking a personalized price that must not be reported
pub const MEMBER_PRICE_MARKER: &str = "my price";

/// Keywords that identify the regulatory notice
pub const RESIDENCY_KEYWORDS: &[&str] = &["california residents", "prop 65"];

/// Label stripped from the regulatory notice text
pub const RESIDENCY_LABEL: &str = "California Residents:";

/// Notice used when the keyword is present but no text remains
pub const RESIDENCY_SEE_PAGE: &str = "See product page for Prop 65 warning details";

/// Elements naming a manual file
pub const MANUAL_MARKER: &str = "[data-manual-name]";

/// Attribute naming a manual file
pub const MANUAL_MARKER_ATTR: &str = "data-manual-name";

/// The "Manuals & Diagrams" tab
pub const MANUALS_TAB: &[Locator] = &[
    Locator::css("a[href*='#manualsDiagrams']"),
    Locator::css("li[role='tab'] a").all_text(&["manuals", "diagrams"]),
];

/// Content revealed by the manuals tab
pub const MANUALS_SECTION: &str = "#manualsDiagrams, div[class*='manuals']";

/// Links inside model-specific popup menus
pub const POPUP_MENU_LINKS: &str = "ul[class*='data-sheet__popup__list'] a, \
                                    div[class*='data-sheet__popup'] a, \
                                    div[class*='popup'] a";

/// Overlays dismissed after every rendered page load, in order
pub const POPUP_PROBES: [PopupProbe; 3] = [
    PopupProbe {
        name: "country selection",
        locators: &[Locator::css("button, a").any_text(&["start shopping"])],
        scope: ClickScope::First,
    },
    PopupProbe {
        name: "cookie consent",
        locators: &[
            Locator::css("button").any_text(&["accept"]),
            Locator::css("button").exact_text(&["ok"]),
        ],
        scope: ClickScope::First,
    },
    PopupProbe {
        name: "notification",
        locators: &[Locator::css(
            "button[aria-label='Close'], button[class*='close']",
        )],
        scope: ClickScope::AllVisible,
    },
];
