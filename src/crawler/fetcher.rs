//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests, including:
//! - Building a client with a browser-like header profile
//! - GET requests for page bodies
//! - Document downloads written atomically to disk
//! - Retry with exponential backoff for transient failures

use crate::config::FetchConfig;
use crate::crawler::driver::pause;
use crate::crawler::retry::{classify_error, classify_status, FailureKind, RetryPolicy};
use crate::{DownloadError, FetchError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.5";

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Page body
    pub body: String,
}

/// Builds an HTTP client that presents itself like a desktop browser
///
/// # Arguments
///
/// * `config` - The request behavior configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrying HTTP client shared by the static driver and the artifact writer
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry: RetryPolicy,
    download_timeout: Duration,
}

/// Outcome of one attempt, before retry bookkeeping
enum Attempt<T> {
    Done(T),
    Failed(FailureKind, String),
}

impl Fetcher {
    pub fn new(client: Client, retry: RetryPolicy, download_timeout: Duration) -> Self {
        Self {
            client,
            retry,
            download_timeout,
        }
    }

    /// Builds the client and retry policy described by the configuration
    pub fn from_config(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            RetryPolicy::new(config.max_attempts, config.backoff_base()),
            config.download_timeout(),
        ))
    }

    /// Fetches a page body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return the body |
    /// | 5xx, 429 | Retry with backoff |
    /// | Timeout, connection error | Retry with backoff |
    /// | Other status | Fail immediately |
    pub async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        self.with_retries(url, move || async move {
            let response = match self.client.get(url.clone()).send().await {
                Ok(response) => response,
                Err(e) => return Attempt::Failed(classify_error(&e), e.to_string()),
            };

            let response = match check_status(response) {
                Ok(response) => response,
                Err(failure) => return failure,
            };

            let final_url = response.url().clone();
            let status = response.status().as_u16();

            match response.text().await {
                Ok(body) => Attempt::Done(Page {
                    final_url,
                    status,
                    body,
                }),
                Err(e) => Attempt::Failed(classify_error(&e), e.to_string()),
            }
        })
        .await
    }

    /// Downloads a document to `path`, returning the number of bytes written
    ///
    /// The body is received completely before anything is written. It goes
    /// to a `.part` sibling first and is renamed into place, so `path` either
    /// holds a whole document or is untouched.
    pub async fn download(&self, url: &Url, path: &Path) -> Result<u64, DownloadError> {
        let bytes = self
            .with_retries(url, move || async move {
                let request = self.client.get(url.clone()).timeout(self.download_timeout);
                let response = match request.send().await {
                    Ok(response) => response,
                    Err(e) => return Attempt::Failed(classify_error(&e), e.to_string()),
                };

                let response = match check_status(response) {
                    Ok(response) => response,
                    Err(failure) => return failure,
                };

                match response.bytes().await {
                    Ok(bytes) => Attempt::Done(bytes),
                    Err(e) => Attempt::Failed(classify_error(&e), e.to_string()),
                }
            })
            .await?;

        let partial = partial_path(path);
        let write_error = |source| DownloadError::Write {
            path: path.display().to_string(),
            source,
        };

        tokio::fs::write(&partial, &bytes).await.map_err(write_error)?;
        if let Err(e) = tokio::fs::rename(&partial, path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(write_error(e));
        }

        Ok(bytes.len() as u64)
    }

    async fn with_retries<T, F, Fut>(&self, url: &Url, mut attempt_fn: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Attempt<T>>,
    {
        let mut attempt = 1;

        loop {
            match attempt_fn().await {
                Attempt::Done(value) => return Ok(value),
                Attempt::Failed(kind, error) => match self.retry.next_delay(kind, attempt) {
                    Some(delay) => {
                        tracing::warn!(
                            "Attempt {}/{} for {} failed: {}; retrying in {:?}",
                            attempt,
                            self.retry.max_attempts(),
                            url,
                            error,
                            delay
                        );
                        pause(delay).await;
                        attempt += 1;
                    }
                    None => {
                        return Err(match kind {
                            FailureKind::Permanent => FetchError::Permanent {
                                url: url.to_string(),
                                reason: error,
                            },
                            FailureKind::Transient => FetchError::Transient {
                                url: url.to_string(),
                                attempts: attempt,
                                last_error: error,
                            },
                        });
                    }
                },
            }
        }
    }
}

fn check_status<T>(response: Response) -> Result<Response, Attempt<T>> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Attempt::Failed(
            classify_status(status),
            format!("HTTP {}", status),
        ))
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}
