use crate::config::SessionConfig;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

/// One logical identity lifetime (proxy IP plus cookie jar)
///
/// A session is replaced wholesale on rotation; a superseded session is never
/// touched again.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Opaque identifier, unique across rotations within a run
    pub id: String,

    /// Requests issued under this session so far
    pub request_count: u32,

    /// Request count at which a scheduled rotation becomes due
    pub rotation_threshold: u32,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session with a threshold drawn from `[min, max]`
    fn new(sequence: u64, min_requests: u32, max_requests: u32) -> Self {
        let mut rng = rand::thread_rng();
        let rotation_threshold = if min_requests >= max_requests {
            min_requests
        } else {
            rng.gen_range(min_requests..=max_requests)
        };

        Self {
            id: format!("s{}_{:08x}", sequence, rng.gen::<u32>()),
            request_count: 0,
            rotation_threshold,
            created_at: Utc::now(),
        }
    }

    /// Returns true once the session has served its quota of requests
    pub fn is_exhausted(&self) -> bool {
        self.request_count >= self.rotation_threshold
    }
}

/// Why a session was replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotationReason {
    /// The request-count threshold was reached
    Scheduled,
    /// The site answered with a block signal (HTTP 503)
    Emergency,
}

impl fmt::Display for RotationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "scheduled"),
            Self::Emergency => write!(f, "emergency"),
        }
    }
}

/// Rotation settings resolved from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub enabled: bool,
    pub min_requests: u32,
    pub max_requests: u32,
}

impl From<&SessionConfig> for RotationPolicy {
    fn from(config: &SessionConfig) -> Self {
        Self {
            enabled: config.rotation_enabled,
            min_requests: config.min_requests,
            max_requests: config.max_requests,
        }
    }
}

/// Decides when the active session is replaced
///
/// The rotator only keeps counters; it never touches the network. When
/// rotation is disabled a single session lives for the whole run.
#[derive(Debug)]
pub struct SessionRotator {
    policy: RotationPolicy,

    /// Emergency rotation needs a proxy: a new session without one keeps the
    /// same exit IP
    proxy_configured: bool,

    active: Session,
    sequence: u64,
    rotations: u32,
    emergency_rotations: u32,
}

impl SessionRotator {
    /// Creates a rotator with its first session already active
    pub fn new(policy: RotationPolicy, proxy_configured: bool) -> Self {
        let active = Session::new(1, policy.min_requests, policy.max_requests);
        tracing::debug!(
            "Session {} created (threshold {})",
            active.id,
            active.rotation_threshold
        );

        Self {
            policy,
            proxy_configured,
            active,
            sequence: 1,
            rotations: 0,
            emergency_rotations: 0,
        }
    }

    /// Returns true iff rotation is enabled and the session quota is used up
    pub fn should_rotate(&self) -> bool {
        self.policy.enabled && self.active.is_exhausted()
    }

    /// Replaces the active session
    ///
    /// Returns false (and changes nothing) when rotation is disabled.
    pub fn rotate(&mut self, reason: RotationReason) -> bool {
        if !self.policy.enabled {
            return false;
        }

        self.sequence += 1;
        let next = Session::new(
            self.sequence,
            self.policy.min_requests,
            self.policy.max_requests,
        );
        let previous = std::mem::replace(&mut self.active, next);

        self.rotations += 1;
        if reason == RotationReason::Emergency {
            self.emergency_rotations += 1;
        }

        tracing::info!(
            "Rotated session ({}): {} after {} requests -> {} (threshold {})",
            reason,
            previous.id,
            previous.request_count,
            self.active.id,
            self.active.rotation_threshold
        );
        true
    }

    /// Performs a scheduled rotation if one is due
    pub fn rotate_if_due(&mut self) -> bool {
        self.should_rotate() && self.rotate(RotationReason::Scheduled)
    }

    /// Reacts to a block signal
    ///
    /// Forces an emergency rotation when rotation is enabled and a proxy is
    /// configured; returns whether a rotation happened.
    pub fn on_block_signal(&mut self) -> bool {
        self.emergency_eligible() && self.rotate(RotationReason::Emergency)
    }

    /// Returns true if a block signal would trigger an emergency rotation
    pub fn emergency_eligible(&self) -> bool {
        self.policy.enabled && self.proxy_configured
    }

    /// Counts one request against the active session
    pub fn record_request(&mut self) {
        self.active.request_count += 1;
    }

    /// The active session
    pub fn session(&self) -> &Session {
        &self.active
    }

    /// Identifier of the active session
    pub fn session_id(&self) -> &str {
        &self.active.id
    }

    /// Number of rotations performed (scheduled and emergency)
    pub fn rotations(&self) -> u32 {
        self.rotations
    }

    /// Number of emergency rotations performed
    pub fn emergency_rotations(&self) -> u32 {
        self.emergency_rotations
    }

    /// Number of sessions that have been active during the run
    pub fn sessions_created(&self) -> u32 {
        self.rotations + 1
    }

    pub fn policy(&self) -> RotationPolicy {
        self.policy
    }
}
