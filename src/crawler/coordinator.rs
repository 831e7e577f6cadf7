//! Run coordinator - main scraping orchestration logic
//!
//! This module sequences a whole run:
//! - Creating the output root
//! - Traversing the listing for product references
//! - Extracting details and writing artifacts for each product in turn
//! - Pacing requests between products
//! - Collecting run statistics

use crate::config::{Config, FetchMode};
use crate::crawler::browser::ChromeDriver;
use crate::crawler::detail::extract_details;
use crate::crawler::driver::{pause, PageDriver};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::listing::traverse;
use crate::crawler::static_driver::StaticDriver;
use crate::output::{product_folder, ArtifactWriter, RunStats};
use crate::ScrapeError;
use std::path::PathBuf;
use url::Url;

/// How a run ended
#[derive(Debug)]
pub enum RunOutcome {
    /// The listing produced no products; nothing was written
    NoProducts,
    /// Every product was processed
    Completed(RunStats),
}

/// Owns the page driver and HTTP client for the duration of a run
pub struct Coordinator {
    config: Config,
    base: Url,
    listing: Url,
    output_root: PathBuf,
    driver: Box<dyn PageDriver>,
    writer: ArtifactWriter,
}

impl Coordinator {
    /// Creates a coordinator with the driver selected by the fetch mode
    ///
    /// In browser mode this launches Chromium; the browser is closed when the
    /// coordinator is dropped.
    pub async fn new(config: Config) -> Result<Self, ScrapeError> {
        let fetcher = Fetcher::from_config(&config.fetch)?;

        let driver: Box<dyn PageDriver> = match config.fetch.mode {
            FetchMode::Browser => Box::new(ChromeDriver::launch(&config.fetch).await?),
            FetchMode::Static => Box::new(StaticDriver::new(fetcher.clone())),
        };

        Self::with_driver(config, driver, fetcher)
    }

    /// Creates a coordinator around an existing driver
    pub fn with_driver(
        config: Config,
        driver: Box<dyn PageDriver>,
        fetcher: Fetcher,
    ) -> Result<Self, ScrapeError> {
        let base = config.site.base()?;
        let listing = config.site.listing()?;
        let output_root = PathBuf::from(&config.output.root);
        let writer = ArtifactWriter::new(fetcher, config.output.dedup);

        Ok(Self {
            config,
            base,
            listing,
            output_root,
            driver,
            writer,
        })
    }

    /// Runs the whole pipeline
    ///
    /// Only setup failures are returned as errors. Pages, products and
    /// downloads that fail are logged and skipped.
    pub async fn run(&mut self) -> Result<RunOutcome, ScrapeError> {
        tracing::info!(
            "Starting run: {} ({} mode, {} documents)",
            self.listing,
            match self.config.fetch.mode {
                FetchMode::Browser => "browser",
                FetchMode::Static => "static",
            },
            self.config.output.dedup
        );

        tokio::fs::create_dir_all(&self.output_root)
            .await
            .map_err(|source| ScrapeError::OutputRoot {
                path: self.output_root.display().to_string(),
                source,
            })?;

        let timing = &self.config.timing;
        let references = traverse(
            self.driver.as_mut(),
            &self.listing,
            &self.base,
            self.config.site.max_pages,
            timing,
        )
        .await;

        if references.is_empty() {
            tracing::warn!("No products found on {}", self.listing);
            tracing::warn!("Possible causes:");
            tracing::warn!("  - products are rendered by scripts the current mode did not run");
            tracing::warn!("  - the page structure no longer matches the expected markup");
            tracing::warn!("  - access is restricted (authentication, region or bot blocking)");
            return Ok(RunOutcome::NoProducts);
        }

        let total = references.len();
        let mut stats = RunStats::start(total);

        for (index, reference) in references.iter().enumerate() {
            tracing::info!("Processing part {}/{}: {}", index + 1, total, reference.name);

            let details = extract_details(
                self.driver.as_mut(),
                &reference.detail_url,
                &self.base,
                self.config.output.dedup,
                timing,
            )
            .await;

            let folder = product_folder(&self.output_root, &reference.name);
            let report = self.writer.write(&details, &folder).await;
            tracing::info!(
                "Scraped: {} ({} PDFs downloaded)",
                folder.display(),
                report.downloaded
            );
            stats.record(&details, &report);

            if index + 1 < total {
                pause(timing.politeness()).await;
            }
        }

        stats.finish();
        tracing::info!("Scraping complete! {} parts processed.", total);
        Ok(RunOutcome::Completed(stats))
    }
}
