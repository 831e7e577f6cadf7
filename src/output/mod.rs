//! Output module for per-product artifacts and run reports
//!
//! This module handles:
//! - Rendering the product summary text
//! - Sanitizing product names into folder names
//! - Writing summaries and downloading documents
//! - Recording run statistics

pub mod paths;
pub mod stats;
pub mod summary;
mod writer;

pub use paths::{document_file_name, product_folder, sanitize_name, SUMMARY_FILE};
pub use stats::{print_statistics, RunStats};
pub use summary::{render_summary, NO_DOCUMENTS_LINE};
pub use writer::{ArtifactReport, ArtifactWriter};
