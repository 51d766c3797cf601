/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VerigateError>;

/// Why a webhook signature check failed.
///
/// Carried inside [`VerigateError::SignatureVerification`] so integration
/// code can log or branch on the precise failure without string matching.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureFailure {
    /// The request carried no signature header at all.
    #[error("signature header missing")]
    MissingHeader,

    /// The header could not be parsed into a timestamp and at least one
    /// candidate signature, or the timestamp was negative.
    #[error("signature header malformed")]
    MalformedHeader,

    /// The signed timestamp fell outside the replay tolerance window,
    /// in either direction.
    #[error("timestamp {timestamp} outside tolerance of {tolerance_seconds}s (now {now})")]
    TimestampOutOfTolerance {
        timestamp: i64,
        now: i64,
        tolerance_seconds: u64,
    },

    /// Every candidate signature in the header failed the constant-time
    /// comparison against the recomputed digest.
    #[error("no candidate signature matched")]
    NoSignatureMatched,
}

/// The main error type for gateway integrations.
///
/// Every variant carries structured data, not just a message, so callers
/// can decide programmatically whether a failure is worth retrying:
/// transport failures and polling timeouts are transient, while signature,
/// validation, and authentication failures are permanent.
#[derive(Debug, thiserror::Error)]
pub enum VerigateError {
    /// An inbound webhook failed signature verification.
    #[error("signature verification failed: {reason}")]
    SignatureVerification { reason: SignatureFailure },

    /// Malformed parameters or a response shape that failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// The offending field, when known.
        field: Option<String>,
        message: String,
    },

    /// A session did not reach a terminal status before the polling
    /// deadline elapsed.
    #[error("session {session_id} did not complete within {duration_ms}ms (last status: {last_status})")]
    Timeout {
        session_id: String,
        /// Last observed non-terminal status, or `"unknown"` if no
        /// retrieval ever succeeded.
        last_status: String,
        duration_ms: u64,
    },

    /// Transport-level failure surfaced by a caller-supplied retrieval or
    /// transport function.
    #[error("connection to the verification gateway failed: {0}")]
    Connection(#[from] anyhow::Error),

    /// The gateway rejected our credentials (e.g. a 401). Fatal; never
    /// retried automatically.
    #[error("credentials rejected by the verification gateway")]
    Authentication {
        /// HTTP status reported by the gateway, when available.
        status: Option<u16>,
    },

    /// An in-flight poll was canceled by the caller.
    #[error("polling for session {session_id} was canceled")]
    Canceled { session_id: String },
}

impl VerigateError {
    pub fn signature_verification(reason: SignatureFailure) -> Self {
        Self::SignatureVerification { reason }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Validation failure attributed to a specific field.
    pub fn validation_for(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    pub fn timeout(
        session_id: impl Into<String>,
        last_status: impl Into<String>,
        duration_ms: u64,
    ) -> Self {
        Self::Timeout {
            session_id: session_id.into(),
            last_status: last_status.into(),
            duration_ms,
        }
    }

    pub fn authentication(status: Option<u16>) -> Self {
        Self::Authentication { status }
    }

    pub fn canceled(session_id: impl Into<String>) -> Self {
        Self::Canceled {
            session_id: session_id.into(),
        }
    }

    /// Whether the failure is transient and worth retrying.
    ///
    /// Connection failures and polling timeouts are transient. Signature
    /// mismatches, validation failures, rejected credentials, and caller
    /// cancellation are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout { .. })
    }

    /// Suggested HTTP status for a webhook endpoint surfacing this error.
    ///
    /// Verification failures map to 401; a payload that fails validation
    /// after a successful signature check maps to 400. Everything else is
    /// a server-side condition, so the sender keeps retrying delivery.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::SignatureVerification { .. } | Self::Authentication { .. } => 401,
            Self::Validation { .. } => 400,
            Self::Connection(_) => 502,
            Self::Timeout { .. } => 504,
            Self::Canceled { .. } => 500,
        }
    }
}
