//! Run statistics
//!
//! Counters collected while the coordinator works through the product list,
//! printed at the end of a run.

use crate::model::ProductDetails;
use crate::output::writer::ArtifactReport;
use chrono::{DateTime, Utc};

/// Counters for one run
#[derive(Debug, Clone)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Unique product references found on the listing
    pub products_found: usize,

    /// Products whose artifact folder was written
    pub products_processed: usize,

    /// Products whose detail page yielded no attributes at all
    pub products_without_details: usize,

    /// Document links after deduplication
    pub documents_found: usize,

    pub documents_downloaded: usize,
    pub download_failures: usize,
    pub bytes_downloaded: u64,
}

impl RunStats {
    /// Starts the clock for a run over `products_found` products
    pub fn start(products_found: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            products_found,
            products_processed: 0,
            products_without_details: 0,
            documents_found: 0,
            documents_downloaded: 0,
            download_failures: 0,
            bytes_downloaded: 0,
        }
    }

    /// Adds one product's results
    pub fn record(&mut self, details: &ProductDetails, report: &ArtifactReport) {
        if report.summary_written {
            self.products_processed += 1;
        }
        if details.attributes.filled_count() == 0 {
            self.products_without_details += 1;
        }
        self.documents_found += details.documents.len();
        self.documents_downloaded += report.downloaded;
        self.download_failures += report.failed_downloads;
        self.bytes_downloaded += report.bytes_downloaded;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Whole seconds between start and finish, once finished
    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStats) {
    println!("=== Run Statistics ===\n");

    println!("Overview:");
    println!(
        "  Started: {}",
        stats.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(finished) = stats.finished_at {
        println!("  Finished: {}", finished.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(seconds) = stats.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    println!("Products:");
    println!("  Found on listing: {}", stats.products_found);
    println!("  Processed: {}", stats.products_processed);
    if stats.products_without_details > 0 {
        println!("  Without details: {}", stats.products_without_details);
    }
    println!();

    println!("Documents:");
    println!("  Links found: {}", stats.documents_found);
    println!("  Downloaded: {}", stats.documents_downloaded);
    println!("  Failed: {}", stats.download_failures);
    println!("  Bytes downloaded: {}", stats.bytes_downloaded);
    println!();

    let success_rate = if stats.documents_found > 0 {
        (stats.documents_downloaded as f64 / stats.documents_found as f64) * 100.0
    } else {
        100.0
    };

    println!(
        "Download Success Rate: {:.1}% ({} / {} documents)",
        success_rate, stats.documents_downloaded, stats.documents_found
    );
}
