//! Identity module: who each request claims to be
//!
//! An identity is a user agent drawn at random per request plus, when
//! proxying is enabled, a proxy endpoint scoped to the active session.

mod proxy;
mod user_agents;

pub use proxy::{ProxyGateway, PROXY_PASSWORD_ENV};
pub use user_agents::{random_user_agent, USER_AGENTS};

/// Supplies request identities
pub trait IdentityProvider {
    /// A user agent for the next request
    fn user_agent(&self) -> String;

    /// Proxy URL for a session, or None when requests go out directly
    ///
    /// The same session id must always yield the same endpoint.
    fn proxy_url(&self, session_id: &str) -> Option<String>;

    /// Proxy URL safe to write to logs
    fn masked_proxy_url(&self, session_id: &str) -> Option<String> {
        self.proxy_url(session_id).map(|_| "<proxy>".to_string())
    }

    /// Returns true if requests are routed through a proxy
    fn has_proxy(&self) -> bool;
}

/// Random user agents from the fixed pool plus an optional proxy gateway
#[derive(Debug, Clone, Default)]
pub struct RotatingIdentity {
    proxy: Option<ProxyGateway>,
}

impl RotatingIdentity {
    pub fn new(proxy: Option<ProxyGateway>) -> Self {
        Self { proxy }
    }
}

impl IdentityProvider for RotatingIdentity {
    fn user_agent(&self) -> String {
        random_user_agent().to_string()
    }

    fn proxy_url(&self, session_id: &str) -> Option<String> {
        self.proxy.as_ref().map(|gw| gw.url_for(session_id))
    }

    fn masked_proxy_url(&self, session_id: &str) -> Option<String> {
        self.proxy.as_ref().map(|gw| gw.masked_url_for(session_id))
    }

    fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }
}
