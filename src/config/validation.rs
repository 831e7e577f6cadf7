use crate::config::types::{Config, FetchConfig, OutputConfig, SiteConfig, TimingConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_fetch_config(&config.fetch)?;
    validate_timing_config(&config.timing)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the target site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let base = validate_http_url("base-url", &config.base_url)?;
    let listing = validate_http_url("listing-url", &config.listing_url)?;

    if base.host_str() != listing.host_str() {
        return Err(ConfigError::Validation(format!(
            "listing-url host '{}' does not match base-url host '{}'",
            listing.host_str().unwrap_or_default(),
            base.host_str().unwrap_or_default()
        )));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max-pages must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates request behavior
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.download_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "download-timeout-secs must be >= 1, got {}",
            config.download_timeout_secs
        )));
    }

    Ok(())
}

/// Validates waits; pauses may be zero but waits must be able to succeed
fn validate_timing_config(config: &TimingConfig) -> Result<(), ConfigError> {
    if config.product_wait == 0 {
        return Err(ConfigError::Validation(
            "product-wait must be > 0ms".to_string(),
        ));
    }

    if config.detail_wait == 0 {
        return Err(ConfigError::Validation(
            "detail-wait must be > 0ms".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.root.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output root cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Parses a URL and checks that it is HTTP or HTTPS with a host
fn validate_http_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} '{}' must use HTTP or HTTPS",
            key, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' has no host",
            key, value
        )));
    }

    Ok(url)
}
