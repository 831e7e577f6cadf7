//! Per-product artifact writer
//!
//! Writes `product_info.txt` and downloads every document link into the
//! product's folder. Download failures are counted and logged; they never
//! stop sibling downloads.

use crate::crawler::Fetcher;
use crate::model::{DedupMode, ProductDetails};
use crate::output::paths::{document_file_name, SUMMARY_FILE};
use crate::output::summary::render_summary;
use std::path::{Path, PathBuf};

/// What was written for one product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactReport {
    pub folder: PathBuf,
    pub summary_written: bool,
    pub downloaded: usize,
    pub failed_downloads: usize,
    pub bytes_downloaded: u64,
}

pub struct ArtifactWriter {
    fetcher: Fetcher,
    mode: DedupMode,
}

impl ArtifactWriter {
    pub fn new(fetcher: Fetcher, mode: DedupMode) -> Self {
        Self { fetcher, mode }
    }

    /// Writes the summary, then downloads documents as `manual_<n>.pdf`
    pub async fn write(&self, details: &ProductDetails, folder: &Path) -> ArtifactReport {
        let mut report = ArtifactReport {
            folder: folder.to_path_buf(),
            ..ArtifactReport::default()
        };

        if let Err(e) = tokio::fs::create_dir_all(folder).await {
            tracing::warn!("Failed to create {}: {}", folder.display(), e);
            report.failed_downloads = details.documents.len();
            return report;
        }

        let summary = render_summary(details, self.mode);
        match write_whole(&folder.join(SUMMARY_FILE), summary.as_bytes()).await {
            Ok(()) => {
                report.summary_written = true;
                tracing::info!("  Saved info: {}", SUMMARY_FILE);
            }
            Err(e) => tracing::warn!("Failed to write summary in {}: {}", folder.display(), e),
        }

        for (index, link) in details.documents.iter().enumerate() {
            let file_name = document_file_name(index + 1);
            match self.fetcher.download(link.url(), &folder.join(&file_name)).await {
                Ok(bytes) => {
                    report.downloaded += 1;
                    report.bytes_downloaded += bytes;
                    tracing::info!("  Downloaded: {} ({} bytes)", file_name, bytes);
                }
                Err(e) => {
                    report.failed_downloads += 1;
                    tracing::warn!("  Failed to download PDF {}: {}", link, e);
                }
            }
        }

        report
    }
}

/// Writes a file through a temporary sibling so readers never see half of it
async fn write_whole(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let temporary = path.with_extension("tmp");
    tokio::fs::write(&temporary, contents).await?;
    tokio::fs::rename(&temporary, path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::model::DocumentLink;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn writer(mode: DedupMode) -> ArtifactWriter {
        let config = FetchConfig {
            max_attempts: 1,
            ..FetchConfig::default()
        };
        ArtifactWriter::new(Fetcher::from_config(&config).unwrap(), mode)
    }

    #[tokio::test]
    async fn test_failed_download_does_not_stop_siblings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/m/good.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/m/gone.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let mut details =
            ProductDetails::empty(Url::parse(&format!("{}/p/1", server.uri())).unwrap());
        details.documents = vec![
            DocumentLink::new(Url::parse(&format!("{}/m/gone.pdf", server.uri())).unwrap()),
            DocumentLink::new(Url::parse(&format!("{}/m/good.pdf", server.uri())).unwrap()),
        ];

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Widget");
        let report = writer(DedupMode::Unique).write(&details, &folder).await;

        assert!(report.summary_written);
        assert_eq!(report.downloaded, 1);
        assert_eq!(report.failed_downloads, 1);
        assert_eq!(report.bytes_downloaded, 4);
        assert!(!folder.join("manual_1.pdf").exists());
        assert!(folder.join("manual_2.pdf").exists());

        let summary = std::fs::read_to_string(folder.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("PDF 1: "));
        assert!(summary.contains("PDF 2: "));
    }

    #[tokio::test]
    async fn test_rerun_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("Widget");
        let details = ProductDetails::empty(Url::parse("https://www.partstown.com/p/1").unwrap());

        writer(DedupMode::Unique).write(&details, &folder).await;
        let report = writer(DedupMode::All).write(&details, &folder).await;

        assert!(report.summary_written);
        let summary = std::fs::read_to_string(folder.join(SUMMARY_FILE)).unwrap();
        assert!(summary.contains("(ALL)"));
        assert!(!folder.join("product_info.tmp").exists());
    }
}
