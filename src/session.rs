//! Session status snapshots returned by the verification gateway.

use serde::{Deserialize, Serialize};

/// Status of a verification session.
///
/// The gateway owns the state machine; this crate only needs to know
/// which states are terminal. States introduced by the gateway after this
/// crate was published deserialize into [`SessionStatus::Other`] and are
/// treated as non-terminal unless the caller supplies its own predicate
/// to [`SessionPoller::poll_with`](crate::poller::SessionPoller::poll_with).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The subject has not finished the verification flow.
    Pending,
    /// Identity/age verification succeeded.
    Verified,
    /// Verification failed.
    Failed,
    /// The subject or an operator canceled the session.
    Canceled,
    /// A gateway-defined status this crate does not know about.
    #[serde(untagged)]
    Other(String),
}

impl SessionStatus {
    /// Whether no further transitions can occur from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Verified | Self::Failed | Self::Canceled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Other(name) => name,
        };
        f.write_str(name)
    }
}

/// One retrieved snapshot of a verification session.
///
/// Read-only from this crate's point of view: only the gateway mutates a
/// session, and the poller takes a fresh copy on every retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Gateway-assigned session identifier.
    #[serde(alias = "sessionId")]
    pub session_id: String,
    /// Current session status.
    pub status: SessionStatus,
    /// Verification-specific fields the gateway attaches to the session
    /// (document type, extracted attributes, failure reasons, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionResult {
    pub fn new(session_id: impl Into<String>, status: SessionStatus) -> Self {
        Self {
            session_id: session_id.into(),
            status,
            extra: serde_json::Map::new(),
        }
    }
}
