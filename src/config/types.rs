use serde::Deserialize;

/// Search URL used when no start URL is configured
pub const DEFAULT_START_URL: &str =
    "https://www.amazon.com/s?k=wireless+headphones&rh=p_36%3A-10000&ref=sr_nr_p_36_1";

/// Main configuration structure for Shelf-Scout
///
/// Every section and every key is optional; a missing file or an empty one
/// yields the defaults listed on each field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub pacing: PacingConfig,
    pub proxy: ProxyConfig,
    pub session: SessionConfig,
    pub output: OutputConfig,
}

/// What to do with a product whose price exceeds the ceiling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverCeilingPolicy {
    /// Extract the product but never emit it
    Drop,
    /// Emit the product with `over_price_ceiling` set
    Flag,
}

/// Crawl scope configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlConfig {
    /// Search results page the crawl starts from
    pub start_url: String,

    /// Hard cap on emitted records
    pub max_products: u64,

    /// Optional cap on search result pages visited
    pub max_pages: Option<u32>,

    /// Highest price (inclusive) a product may have to be emitted unflagged
    pub price_ceiling: f64,

    /// Handling of products priced above the ceiling
    pub over_ceiling: OverCeilingPolicy,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            max_products: 20_000,
            max_pages: None,
            price_ceiling: 100.0,
            over_ceiling: OverCeilingPolicy::Drop,
        }
    }
}

/// Request pacing and retry configuration (all durations in seconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PacingConfig {
    /// Lower bound of the politeness delay before every request
    pub min_delay: f64,

    /// Upper bound of the politeness delay before every request
    pub max_delay: f64,

    /// Lower bound of the cooldown after a 503 block signal
    pub block_cooldown_min: f64,

    /// Upper bound of the cooldown after a 503 block signal
    pub block_cooldown_max: f64,

    /// Lower bound of the pause between search result pages
    pub page_pause_min: f64,

    /// Upper bound of the pause between search result pages
    pub page_pause_max: f64,

    /// Per-request timeout
    pub request_timeout: f64,

    /// Attempts per URL before giving up
    pub max_retries: u32,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay: 1.0,
            max_delay: 3.0,
            block_cooldown_min: 10.0,
            block_cooldown_max: 15.0,
            page_pause_min: 2.0,
            page_pause_max: 4.0,
            request_timeout: 30.0,
            max_retries: 3,
        }
    }
}

/// Proxy gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProxyConfig {
    /// Route requests through the proxy gateway
    pub enabled: bool,

    /// Proxy pool selectors
    pub groups: Vec<String>,

    /// Optional two-letter country filter
    pub country: Option<String>,

    /// Gateway host name
    pub host: String,

    /// Gateway port
    pub port: u16,

    /// Gateway password; falls back to `APIFY_PROXY_PASSWORD`
    pub password: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            groups: vec!["RESIDENTIAL".to_string()],
            country: None,
            host: "proxy.apify.com".to_string(),
            port: 8000,
            password: None,
        }
    }
}

/// Session rotation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    /// Enables scheduled and emergency session rotation
    pub rotation_enabled: bool,

    /// Smallest rotation threshold a session may draw
    pub min_requests: u32,

    /// Largest rotation threshold a session may draw
    pub max_requests: u32,

    /// Log session ids, proxy endpoints and the exit IP of every session
    pub show_ip: bool,

    /// Endpoint queried for the exit IP when `show-ip` is on
    pub ip_check_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rotation_enabled: false,
            min_requests: 30,
            max_requests: 50,
            show_ip: false,
            ip_check_url: "https://api.ipify.org?format=json".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// JSON-lines file records are appended to
    pub dataset_path: String,

    /// Optional SQLite database that also receives every record
    pub database_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dataset_path: "./storage/dataset.jsonl".to_string(),
            database_path: None,
        }
    }
}

/// Flat actor input document (camelCase keys)
///
/// Each present key overrides the matching config value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorInput {
    pub start_url: Option<String>,
    pub max_products: Option<u64>,
    pub min_delay: Option<f64>,
    pub max_delay: Option<f64>,
    pub request_timeout: Option<f64>,
    pub use_proxy: Option<bool>,
    pub proxy_groups: Option<Vec<String>>,
    pub proxy_country: Option<String>,
    pub session_rotation_enabled: Option<bool>,
    pub session_min_requests: Option<u32>,
    pub session_max_requests: Option<u32>,
    #[serde(rename = "showIP")]
    pub show_ip: Option<bool>,
}

impl ActorInput {
    /// Applies every present key on top of `config`
    pub fn apply(self, config: &mut Config) {
        if let Some(v) = self.start_url {
            config.crawl.start_url = v;
        }
        if let Some(v) = self.max_products {
            config.crawl.max_products = v;
        }
        if let Some(v) = self.min_delay {
            config.pacing.min_delay = v;
        }
        if let Some(v) = self.max_delay {
            config.pacing.max_delay = v;
        }
        if let Some(v) = self.request_timeout {
            config.pacing.request_timeout = v;
        }
        if let Some(v) = self.use_proxy {
            config.proxy.enabled = v;
        }
        if let Some(v) = self.proxy_groups {
            config.proxy.groups = v;
        }
        if self.proxy_country.is_some() {
            config.proxy.country = self.proxy_country;
        }
        if let Some(v) = self.session_rotation_enabled {
            config.session.rotation_enabled = v;
        }
        if let Some(v) = self.session_min_requests {
            config.session.min_requests = v;
        }
        if let Some(v) = self.session_max_requests {
            config.session.max_requests = v;
        }
        if let Some(v) = self.show_ip {
            config.session.show_ip = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.crawl.start_url, DEFAULT_START_URL);
        assert_eq!(config.crawl.max_products, 20_000);
        assert_eq!(config.pacing.min_delay, 1.0);
        assert_eq!(config.pacing.max_delay, 3.0);
        assert_eq!(config.pacing.request_timeout, 30.0);
        assert!(!config.proxy.enabled);
        assert_eq!(config.proxy.groups, vec!["RESIDENTIAL".to_string()]);
        assert!(config.proxy.country.is_none());
        assert!(!config.session.rotation_enabled);
        assert_eq!(config.session.min_requests, 30);
        assert_eq!(config.session.max_requests, 50);
        assert!(!config.session.show_ip);
    }

    #[test]
    fn test_actor_input_overrides_only_present_keys() {
        let input: ActorInput = serde_json::from_str(
            r#"{"startUrl": "https://example.com/s?k=mice", "useProxy": true, "showIP": true}"#,
        )
        .unwrap();

        let mut config = Config::default();
        input.apply(&mut config);

        assert_eq!(config.crawl.start_url, "https://example.com/s?k=mice");
        assert!(config.proxy.enabled);
        assert!(config.session.show_ip);
        assert_eq!(config.crawl.max_products, 20_000);
        assert_eq!(config.session.min_requests, 30);
    }
}
