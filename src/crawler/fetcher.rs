//! HTTP fetcher implementation
//!
//! This module issues every request the crawler makes:
//! - One HTTP client per session, so the cookie jar and proxy endpoint
//!   change together on rotation
//! - Browser-like default headers with a random user agent per request
//! - Per-attempt classification (success, block signal, bad status, transport)
//! - Bounded retries with jittered back-off
//!
//! Failures are values, not errors: the caller receives a [`FetchOutcome`].

use crate::config::Config;
use crate::crawler::{Document, Pacer};
use crate::identity::{IdentityProvider, RotatingIdentity};
use crate::state::SessionRotator;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy, Response, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Why a fetch attempt did not produce a document
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Connection, TLS, body read or timeout error
    Transport { error: String, timeout: bool },

    /// HTTP 503, the site's block signal
    Blocked,

    /// Any other non-200 status
    Status(u16),

    /// The request could not be built (bad URL, bad proxy URL)
    InvalidRequest(String),

    /// Every attempt failed; `last` is the final attempt's reason
    RetriesExhausted {
        attempts: u32,
        last: Option<Box<FailureReason>>,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { error, timeout: true } => write!(f, "timeout: {}", error),
            Self::Transport { error, .. } => write!(f, "transport error: {}", error),
            Self::Blocked => write!(f, "blocked (HTTP 503)"),
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::InvalidRequest(msg) => write!(f, "invalid request: {}", msg),
            Self::RetriesExhausted { attempts, last } => match last {
                Some(last) => write!(f, "gave up after {} attempts, last: {}", attempts, last),
                None => write!(f, "gave up after {} attempts", attempts),
            },
        }
    }
}

/// Result of a fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// The page was fetched and parsed
    Success(Document),

    /// This attempt failed but another may succeed
    RetryableFailure(FailureReason),

    /// No further attempts will be made
    TerminalFailure(FailureReason),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The parsed document, if the fetch succeeded
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Success(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::RetryableFailure(reason) | Self::TerminalFailure(reason) => Some(reason),
        }
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request settings resolved from configuration
#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub timeout: Duration,
    pub max_retries: u32,
    pub show_ip: bool,
    pub ip_check_url: String,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for FetcherSettings {
    fn from(config: &Config) -> Self {
        Self {
            timeout: Duration::try_from_secs_f64(config.pacing.request_timeout)
                .unwrap_or(DEFAULT_TIMEOUT),
            max_retries: config.pacing.max_retries.max(1),
            show_ip: config.session.show_ip,
            ip_check_url: config.session.ip_check_url.clone(),
        }
    }
}

/// Headers sent with every request alongside the per-request user agent
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// Builds the HTTP client for one session
///
/// The client owns the session's cookie jar; routing it through
/// `proxy_url` pins the session to one proxy exit.
pub fn build_session_client(
    timeout: Duration,
    proxy_url: Option<&str>,
) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .default_headers(default_headers())
        .cookie_store(true)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true);

    if let Some(proxy_url) = proxy_url {
        builder = builder.proxy(Proxy::all(proxy_url)?);
    }

    builder.build()
}

/// Fetches pages under the rotator's active session
pub struct Fetcher<I: IdentityProvider = RotatingIdentity> {
    identity: I,
    pacer: Pacer,
    settings: FetcherSettings,

    /// Client of the session it was built for
    client: Option<(String, Client)>,
}

impl<I: IdentityProvider> Fetcher<I> {
    pub fn new(identity: I, pacer: Pacer, settings: FetcherSettings) -> Self {
        Self {
            identity,
            pacer,
            settings,
            client: None,
        }
    }

    pub fn from_config(config: &Config, identity: I) -> Self {
        Self::new(
            identity,
            Pacer::from_config(&config.pacing),
            FetcherSettings::from(config),
        )
    }

    pub fn pacer(&self) -> &Pacer {
        &self.pacer
    }

    /// Fetches a URL, retrying up to the configured attempt count
    ///
    /// Never returns [`FetchOutcome::RetryableFailure`]. A block signal waits
    /// out the cooldown and a transport error waits a doubled politeness
    /// delay before the next attempt; no wait follows the last attempt.
    pub async fn fetch(&mut self, url: &str, rotator: &mut SessionRotator) -> FetchOutcome {
        let parsed = match parse_target(url) {
            Ok(parsed) => parsed,
            Err(reason) => {
                tracing::error!("Not fetching {}: {}", url, reason);
                return FetchOutcome::TerminalFailure(reason);
            }
        };

        let max_attempts = self.settings.max_retries.max(1);
        let mut last = None;

        for attempt in 1..=max_attempts {
            match self.attempt(&parsed, rotator).await {
                FetchOutcome::Success(doc) => return FetchOutcome::Success(doc),
                FetchOutcome::TerminalFailure(reason) => {
                    tracing::error!("Request to {} failed (attempt {}): {}", url, attempt, reason);
                    return FetchOutcome::TerminalFailure(reason);
                }
                FetchOutcome::RetryableFailure(reason) => {
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        max_attempts,
                        reason
                    );

                    if attempt < max_attempts {
                        let delay = match reason {
                            FailureReason::Blocked => self.pacer.block_cooldown(),
                            FailureReason::Transport { .. } => self.pacer.transport_backoff(),
                            _ => Duration::ZERO,
                        };
                        self.pacer.pause(delay).await;
                    }
                    last = Some(Box::new(reason));
                }
            }
        }

        FetchOutcome::TerminalFailure(FailureReason::RetriesExhausted {
            attempts: max_attempts,
            last,
        })
    }

    /// Performs exactly one request
    pub async fn attempt(&mut self, url: &Url, rotator: &mut SessionRotator) -> FetchOutcome {
        rotator.rotate_if_due();
        self.pacer.pause(self.pacer.politeness_delay()).await;

        let session_id = rotator.session_id().to_string();
        let client = match self.client_for(&session_id).await {
            Ok(client) => client,
            Err(e) => {
                return FetchOutcome::TerminalFailure(FailureReason::InvalidRequest(format!(
                    "failed to build client: {}",
                    e
                )))
            }
        };

        rotator.record_request();
        tracing::debug!(
            "GET {} (session {}, request {})",
            url,
            session_id,
            rotator.session().request_count
        );

        let result = client
            .get(url.clone())
            .header(header::USER_AGENT, self.identity.user_agent())
            .send()
            .await;

        match result {
            Ok(response) => classify_response(response, rotator).await,
            Err(e) if e.is_builder() => {
                FetchOutcome::TerminalFailure(FailureReason::InvalidRequest(e.to_string()))
            }
            Err(e) => FetchOutcome::RetryableFailure(transport_failure(&e)),
        }
    }

    /// The client for `session_id`, built when the session changes
    async fn client_for(&mut self, session_id: &str) -> Result<Client, reqwest::Error> {
        if let Some((id, client)) = &self.client {
            if id == session_id {
                return Ok(client.clone());
            }
        }

        let proxy_url = self.identity.proxy_url(session_id);
        let client = build_session_client(self.settings.timeout, proxy_url.as_deref())?;
        self.client = Some((session_id.to_string(), client.clone()));

        if self.settings.show_ip {
            tracing::info!(
                "Session {} via {}",
                session_id,
                self.identity
                    .masked_proxy_url(session_id)
                    .unwrap_or_else(|| "direct connection".to_string())
            );
            self.log_exit_ip(&client, session_id).await;
        }

        Ok(client)
    }

    /// Asks the IP-echo service which address the session exits from
    async fn log_exit_ip(&self, client: &Client, session_id: &str) {
        let result = client.get(&self.settings.ip_check_url).send().await;
        let body = match result {
            Ok(response) => response.text().await,
            Err(e) => Err(e),
        };

        match body {
            Ok(body) => {
                let ip = serde_json::from_str::<serde_json::Value>(&body)
                    .ok()
                    .and_then(|v| v.get("ip").and_then(|ip| ip.as_str()).map(str::to_string))
                    .unwrap_or_else(|| body.trim().to_string());
                tracing::info!("Session {} exit IP: {}", session_id, ip);
            }
            Err(e) => {
                tracing::warn!("IP check for session {} failed: {}", session_id, e);
            }
        }
    }
}

/// Parses a fetch target, accepting only http(s)
fn parse_target(url: &str) -> Result<Url, FailureReason> {
    let parsed =
        Url::parse(url).map_err(|e| FailureReason::InvalidRequest(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(FailureReason::InvalidRequest(format!(
            "unsupported scheme '{}'",
            scheme
        ))),
    }
}

fn transport_failure(e: &reqwest::Error) -> FailureReason {
    FailureReason::Transport {
        error: e.to_string(),
        timeout: e.is_timeout(),
    }
}

/// Maps a response to a per-attempt outcome
async fn classify_response(response: Response, rotator: &mut SessionRotator) -> FetchOutcome {
    let status = response.status();

    if status == StatusCode::OK {
        let final_url = response.url().clone();
        return match response.bytes().await {
            Ok(body) => FetchOutcome::Success(Document::parse(final_url, &body)),
            Err(e) => FetchOutcome::RetryableFailure(transport_failure(&e)),
        };
    }

    if status == StatusCode::SERVICE_UNAVAILABLE {
        if rotator.on_block_signal() {
            tracing::warn!("Block signal from {}, switched to a new session", response.url());
        } else {
            tracing::warn!("Block signal from {}", response.url());
        }
        return FetchOutcome::RetryableFailure(FailureReason::Blocked);
    }

    FetchOutcome::RetryableFailure(FailureReason::Status(status.as_u16()))
}
