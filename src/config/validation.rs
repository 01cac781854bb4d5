use crate::config::types::{
    Config, CrawlConfig, OutputConfig, PacingConfig, ProxyConfig, SessionConfig,
};
use crate::ConfigError;
use url::Url;

/// Longest single wait any delay range may ask for, in seconds
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_pacing_config(&config.pacing)?;
    validate_proxy_config(&config.proxy)?;
    validate_session_config(&config.session)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl scope configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.max_products == 0 {
        return Err(ConfigError::Validation(
            "max_products must be >= 1".to_string(),
        ));
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if !config.price_ceiling.is_finite() || config.price_ceiling < 0.0 {
        return Err(ConfigError::Validation(format!(
            "price_ceiling must be a non-negative number, got {}",
            config.price_ceiling
        )));
    }

    Ok(())
}

/// Validates pacing configuration
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_range("delay", config.min_delay, config.max_delay)?;
    validate_range(
        "block_cooldown",
        config.block_cooldown_min,
        config.block_cooldown_max,
    )?;
    validate_range("page_pause", config.page_pause_min, config.page_pause_max)?;

    if !config.request_timeout.is_finite() || config.request_timeout <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be > 0 seconds, got {}",
            config.request_timeout
        )));
    }

    if config.max_retries < 1 {
        return Err(ConfigError::Validation(
            "max_retries must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates a `[min, max]` range of seconds
fn validate_range(name: &str, min: f64, max: f64) -> Result<(), ConfigError> {
    if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} bounds must be non-negative seconds, got [{}, {}]",
            name, min, max
        )));
    }

    if max > MAX_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "{} maximum ({}) exceeds {} seconds",
            name, max, MAX_DELAY_SECS
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} minimum ({}) exceeds maximum ({})",
            name, min, max
        )));
    }

    Ok(())
}

/// Validates proxy configuration
fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    if config.groups.is_empty() || config.groups.iter().any(|g| g.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "proxy groups must be non-empty when the proxy is enabled".to_string(),
        ));
    }

    if config.host.is_empty() {
        return Err(ConfigError::Validation(
            "proxy host cannot be empty".to_string(),
        ));
    }

    if let Some(country) = &config.country {
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Validation(format!(
                "proxy country must be a two-letter code, got '{}'",
                country
            )));
        }
    }

    Ok(())
}

/// Validates session rotation configuration
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.min_requests < 1 {
        return Err(ConfigError::Validation(
            "session min_requests must be >= 1".to_string(),
        ));
    }

    if config.min_requests > config.max_requests {
        return Err(ConfigError::Validation(format!(
            "session min_requests ({}) exceeds max_requests ({})",
            config.min_requests, config.max_requests
        )));
    }

    if config.show_ip {
        Url::parse(&config.ip_check_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid ip_check_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dataset_path.is_empty() {
        return Err(ConfigError::Validation(
            "dataset_path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.database_path, Some(p) if p.is_empty()) {
        return Err(ConfigError::Validation(
            "database_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
