//! Product detail extraction
//!
//! Attributes are read from an HTML snapshot of the detail page by pure
//! functions; document links come from [`discover_documents`], which may
//! interact with the page.

use crate::config::TimingConfig;
use crate::crawler::documents::discover_documents;
use crate::crawler::driver::{load_page, PageDriver};
use crate::crawler::parser::{element_text, own_text, selector};
use crate::model::{AttributeRecord, DedupMode, Field, ProductDetails};
use crate::site::{self, RowLayout};
use scraper::{ElementRef, Html};
use url::Url;

/// A label/value pair read from the product info block
#[derive(Debug, Clone, PartialEq, Eq)]
struct Row {
    label: String,
    value: String,
    /// Title or text of a "view models" style link in the row
    link_text: Option<String>,
}

/// Maps a row label to the field it fills
///
/// Matching is case-insensitive and keyword based; the first rule that
/// applies wins, so a row fills at most one field. List Price rows are
/// handled by the price chain instead.
fn field_for_label(label: &str) -> Option<Field> {
    let label = label.to_lowercase();

    if label.contains("quantity") {
        Some(Field::QuantityAvailable)
    } else if label.contains("manufacturer") && !label.contains('#') {
        Some(Field::Manufacturer)
    } else if label.contains("manufacturer #") || (label.contains("mfr") && label.contains('#')) {
        Some(Field::ManufacturerNumber)
    } else if label.contains("parts town #") || label.contains("pt #") {
        Some(Field::PartsTownNumber)
    } else if label.contains("units") {
        Some(Field::Units)
    } else if label.contains("fits models") {
        Some(Field::FitsModels)
    } else {
        None
    }
}

fn collect_rows(document: &Html) -> Vec<Row> {
    site::ROW_LAYOUTS
        .iter()
        .flat_map(|layout| collect_layout_rows(document, layout))
        .collect()
}

fn collect_layout_rows(document: &Html, layout: &RowLayout) -> Vec<Row> {
    let (Some(row_sel), Some(label_sel), Some(value_sel), Some(anchor_sel)) = (
        selector(layout.row),
        selector(layout.label),
        selector(layout.value),
        selector("a"),
    ) else {
        return Vec::new();
    };

    document
        .select(&row_sel)
        .filter_map(|row| {
            let label = element_text(&row.select(&label_sel).next()?);
            let value = element_text(&row.select(&value_sel).next()?);

            let label = label.trim_end_matches(':').trim().to_string();
            if label.is_empty() || value.is_empty() {
                return None;
            }

            let link_text = row
                .select(&anchor_sel)
                .find(|a| {
                    a.value().attr("href").is_some_and(|h| h.contains('#'))
                        || element_text(a).to_lowercase().contains("view")
                })
                .and_then(|a| {
                    a.value()
                        .attr("title")
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty())
                        .or_else(|| Some(element_text(&a)))
                })
                .filter(|text| !text.is_empty());

            Some(Row {
                label,
                value,
                link_text,
            })
        })
        .collect()
}

/// Replaces a "View Models List" placeholder with the row link's text
fn fits_models_value(row: &Row) -> String {
    let lower = row.value.to_lowercase();
    if !(lower.contains("view") || lower.contains("list")) {
        return row.value.clone();
    }

    match &row.link_text {
        Some(text) if *text != row.value => text.clone(),
        _ => row.value.clone(),
    }
}

/// Formats a machine-readable price as `$ 199.50`
fn format_price(raw: &str) -> String {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => format!("$ {:.2}", value),
        _ => format!("$ {}", raw),
    }
}

/// Accepts displayed price text unless it is a personalized price
fn displayed_price(text: &str) -> Option<String> {
    let text = text.trim();
    let usable = !text.is_empty()
        && text.contains('$')
        && !text.to_lowercase().contains(site::MEMBER_PRICE_MARKER);
    usable.then(|| text.to_string())
}

fn first_match<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let sel = selector(css)?;
    document.select(&sel).next()
}

/// Price chain: data attribute, its element's text, labelled row, price element
fn list_price(document: &Html, rows: &[Row]) -> Option<String> {
    if let Some(element) = first_match(document, site::PRICE_DATA) {
        let raw = element
            .value()
            .attr(site::PRICE_DATA_ATTR)
            .map(str::trim)
            .filter(|raw| !raw.is_empty());

        if let Some(raw) = raw {
            return Some(format_price(raw));
        }
        if let Some(price) = displayed_price(&element_text(&element)) {
            return Some(price);
        }
    }

    if let Some(row) = rows
        .iter()
        .find(|row| row.label.to_lowercase().contains("list price"))
    {
        return Some(row.value.clone());
    }

    first_match(document, site::PRICE_TEXT).and_then(|el| displayed_price(&element_text(&el)))
}

/// Finds the regulatory notice
///
/// The first element whose own text mentions a keyword locates it; the
/// notice is its parent's text without the leading label.
fn residency_notice(document: &Html) -> Option<String> {
    let all = selector("body *")?;

    let marker = document.select(&all).find(|el| {
        let text = own_text(el).to_lowercase();
        site::RESIDENCY_KEYWORDS.iter().any(|k| text.contains(k))
    })?;

    let container = marker
        .parent()
        .and_then(ElementRef::wrap)
        .unwrap_or(marker);
    let notice = element_text(&container)
        .replace(site::RESIDENCY_LABEL, "")
        .trim()
        .to_string();

    if notice.is_empty() {
        Some(site::RESIDENCY_SEE_PAGE.to_string())
    } else {
        Some(notice)
    }
}

/// Extracts the fixed attribute set from a detail page snapshot
///
/// Values missing from the page stay unset and render as `N/A`.
pub fn extract_attributes(html: &str) -> AttributeRecord {
    let document = Html::parse_document(html);
    let rows = collect_rows(&document);
    let mut record = AttributeRecord::new();

    if let Some(price) = list_price(&document, &rows) {
        record.set_if_absent(Field::ListPrice, price);
    }

    for row in &rows {
        let Some(field) = field_for_label(&row.label) else {
            continue;
        };

        let value = if field == Field::FitsModels {
            fits_models_value(row)
        } else {
            row.value.clone()
        };
        record.set_if_absent(field, value);
    }

    if let Some(notice) = residency_notice(&document) {
        record.set_if_absent(Field::CaliforniaResidents, notice);
    }

    record
}

/// Loads a detail page and extracts everything from it
///
/// A page that cannot be loaded yields an empty result, which still gets an
/// artifact written.
pub async fn extract_details(
    driver: &mut dyn PageDriver,
    detail_url: &Url,
    base: &Url,
    mode: DedupMode,
    timing: &TimingConfig,
) -> ProductDetails {
    tracing::info!("Fetching details from: {}", detail_url);

    if let Err(e) = load_page(driver, detail_url, timing).await {
        tracing::warn!("Skipping details for {}: {}", detail_url, e);
        return ProductDetails::empty(detail_url.clone());
    }

    if !driver.wait_for(site::DETAIL_READY, timing.detail_wait()).await {
        tracing::warn!("  Product info section not found");
    }

    let attributes = match driver.snapshot().await {
        Ok(html) => extract_attributes(&html),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", detail_url, e);
            AttributeRecord::new()
        }
    };
    tracing::debug!(
        "  {} of {} attributes found",
        attributes.filled_count(),
        Field::ALL.len()
    );

    let documents = discover_documents(driver, detail_url, base, mode, timing).await;

    ProductDetails {
        attributes,
        documents,
        source_url: detail_url.clone(),
    }
}
