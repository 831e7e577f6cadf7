//! Product summary text
//!
//! The layout of `product_info.txt` is fixed: product link, the full field
//! list in order, then the document links or a "none available" line.

use crate::model::{DedupMode, ProductDetails};

const RULE_WIDTH: usize = 60;

/// Line written when a product has no document links
pub const NO_DOCUMENTS_LINE: &str = "No PDF manuals available for this product";

fn heading(lines: &mut Vec<String>, title: &str) {
    let rule = "=".repeat(RULE_WIDTH);
    lines.push(rule.clone());
    lines.push(title.to_string());
    lines.push(rule);
}

/// Renders the summary; lines are joined with `\n`, with no trailing newline
pub fn render_summary(details: &ProductDetails, mode: DedupMode) -> String {
    let mut lines = Vec::new();

    heading(&mut lines, "PRODUCT PAGE - WEB LINK");
    lines.push(format!("Product Page: {}", details.source_url));

    lines.push(String::new());
    heading(&mut lines, "PRODUCT DETAILS");
    for (field, _) in details.attributes.iter() {
        lines.push(format!(
            "{}: {}",
            field,
            details.attributes.display_value(field)
        ));
    }

    lines.push(String::new());
    heading(
        &mut lines,
        &format!("PDF MANUALS - WEB LINKS ({})", mode.heading_tag()),
    );
    if details.documents.is_empty() {
        lines.push(NO_DOCUMENTS_LINE.to_string());
    } else {
        for (index, link) in details.documents.iter().enumerate() {
            lines.push(format!("PDF {}: {}", index + 1, link));
        }
    }

    lines.join("\n")
}
