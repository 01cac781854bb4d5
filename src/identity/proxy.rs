use crate::config::ProxyConfig;
use crate::ScoutError;

/// Environment variable consulted when no proxy password is configured
pub const PROXY_PASSWORD_ENV: &str = "APIFY_PROXY_PASSWORD";

/// Session-aware proxy gateway
///
/// The gateway encodes pool selection, session and country in the proxy
/// username, so the same session id always maps to the same exit IP:
///
/// `http://groups-RESIDENTIAL,session-s1_abcd1234,country-US:<password>@proxy.apify.com:8000`
#[derive(Clone)]
pub struct ProxyGateway {
    host: String,
    port: u16,
    password: String,
    groups: Vec<String>,
    country: Option<String>,
}

impl std::fmt::Debug for ProxyGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyGateway")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("groups", &self.groups)
            .field("country", &self.country)
            .finish_non_exhaustive()
    }
}

impl ProxyGateway {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        password: impl Into<String>,
        groups: Vec<String>,
        country: Option<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            password: password.into(),
            groups,
            country: country.map(|c| c.to_uppercase()),
        }
    }

    /// Builds the gateway from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Proxying is disabled
    /// * `Ok(Some(ProxyGateway))` - Proxying is enabled and a password was found
    /// * `Err(ScoutError)` - Proxying is enabled but no password is available
    pub fn from_config(config: &ProxyConfig) -> Result<Option<Self>, ScoutError> {
        if !config.enabled {
            return Ok(None);
        }

        let password = match &config.password {
            Some(p) => p.clone(),
            None => std::env::var(PROXY_PASSWORD_ENV).map_err(|_| {
                ScoutError::Identity(format!(
                    "proxy enabled but no password configured and {} is unset",
                    PROXY_PASSWORD_ENV
                ))
            })?,
        };

        Ok(Some(Self::new(
            config.host.clone(),
            config.port,
            password,
            config.groups.clone(),
            config.country.clone(),
        )))
    }

    /// Proxy username scoped to a session
    fn username(&self, session_id: &str) -> String {
        let mut username = format!("groups-{},session-{}", self.groups.join("+"), session_id);
        if let Some(country) = &self.country {
            username.push_str(",country-");
            username.push_str(country);
        }
        username
    }

    /// Proxy URL for a session
    pub fn url_for(&self, session_id: &str) -> String {
        format!(
            "http://{}:{}@{}:{}",
            self.username(session_id),
            self.password,
            self.host,
            self.port
        )
    }

    /// Proxy URL for a session with the password hidden, for logs
    pub fn masked_url_for(&self, session_id: &str) -> String {
        format!(
            "http://{}:***@{}:{}",
            self.username(session_id),
            self.host,
            self.port
        )
    }
}
