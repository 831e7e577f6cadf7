//! Artifact folder and file naming

use std::path::{Path, PathBuf};

/// Longest folder name produced, in characters
pub const MAX_NAME_CHARS: usize = 100;

/// Folder name used when nothing survives sanitization
pub const FALLBACK_NAME: &str = "unnamed_product";

/// Name of the summary file inside each product folder
pub const SUMMARY_FILE: &str = "product_info.txt";

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turns a product name into a safe folder name
///
/// Removes characters that are illegal in paths on common filesystems and
/// control characters, trims, and truncates to [`MAX_NAME_CHARS`].
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();

    let truncated: String = cleaned.trim().chars().take(MAX_NAME_CHARS).collect();
    let truncated = truncated.trim_end();

    if truncated.is_empty() || truncated == "." || truncated == ".." {
        FALLBACK_NAME.to_string()
    } else {
        truncated.to_string()
    }
}

/// Folder for one product under the output root
pub fn product_folder(root: &Path, name: &str) -> PathBuf {
    root.join(sanitize_name(name))
}

/// File name of the n-th downloaded document (1-based)
pub fn document_file_name(index: usize) -> String {
    format!("manual_{}.pdf", index)
}
