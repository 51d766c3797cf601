//! Inbound webhook authentication.
//!
//! Decides whether a raw callback from the verification gateway is
//! authentic and fresh, then hands the payload to a caller-supplied
//! parser. Pure with respect to its inputs and the clock: the crypto
//! check is single-shot and never retried.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::config::WebhookConfig;
use crate::error::{Result, SignatureFailure, VerigateError};
use crate::signature::{digest, parse_header, unix_now};

/// Default replay tolerance window.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Verifies signed webhook callbacks from the verification gateway.
///
/// The expected header format is `t=<unix_seconds>,v1=<hex_hmac_sha256>`,
/// where the digest is HMAC-SHA256 over `"{timestamp}.{body}"`. Multiple
/// `v1` entries are accepted during secret rotation; any one match passes.
///
/// The secret is stored using [`SecretString`] to prevent accidental
/// exposure in logs or debug output.
///
/// # Example
///
/// ```rust,ignore
/// use verigate::webhooks::WebhookVerifier;
///
/// let verifier = WebhookVerifier::new("whsec_your_secret".to_string());
///
/// // In your webhook endpoint:
/// let event: SessionEvent = verifier.construct_event(
///     body_bytes,
///     signature_header,
///     |body| serde_json::from_str(body),
/// )?;
/// ```
#[derive(Debug)]
pub struct WebhookVerifier {
    secret: SecretString,
    tolerance: Duration,
}

impl WebhookVerifier {
    /// Create a verifier with the default 300-second tolerance window.
    pub fn new(secret: impl Into<SecretString>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Override the replay tolerance window.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Build a verifier from a [`WebhookConfig`].
    ///
    /// # Errors
    /// Fails with a `Validation` error when the config carries no secret.
    pub fn from_config(config: &WebhookConfig) -> Result<Self> {
        let secret = config
            .secret
            .clone()
            .ok_or_else(|| VerigateError::validation_for("secret", "webhook secret is not set"))?;

        Ok(Self {
            secret,
            tolerance: Duration::from_secs(config.tolerance_seconds),
        })
    }

    /// Verify a webhook payload against its signature header.
    ///
    /// Returns `false` on any failure (malformed header, stale or
    /// future-dated timestamp, no matching signature) so integration code
    /// can choose its own response mapping. Use [`check`](Self::check)
    /// when the failure reason matters.
    pub fn verify(&self, payload: impl AsRef<[u8]>, header: &str) -> bool {
        self.verify_at(payload, header, unix_now())
    }

    /// Like [`verify`](Self::verify), evaluated at a fixed clock reading.
    ///
    /// Intended for tests and for callers that batch-process stored
    /// deliveries against their original receipt time.
    pub fn verify_at(&self, payload: impl AsRef<[u8]>, header: &str, now: i64) -> bool {
        match self.check_at(payload.as_ref(), header, now) {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(%error, "webhook signature verification failed");
                false
            }
        }
    }

    /// Verify a payload, reporting the precise failure.
    pub fn check(&self, payload: impl AsRef<[u8]>, header: &str) -> Result<()> {
        self.check_at(payload.as_ref(), header, unix_now())
    }

    /// [`check`](Self::check) for endpoints where the signature header may
    /// be absent from the request entirely.
    ///
    /// HTTP frameworks surface a missing header as `None`; that maps to
    /// the distinct [`SignatureFailure::MissingHeader`] reason so endpoint
    /// logs can tell an unsigned request apart from a malformed one.
    pub fn check_header(&self, payload: impl AsRef<[u8]>, header: Option<&str>) -> Result<()> {
        match header {
            Some(header) => self.check(payload, header),
            None => Err(VerigateError::signature_verification(
                SignatureFailure::MissingHeader,
            )),
        }
    }

    /// [`check`](Self::check) at a fixed clock reading.
    pub fn check_at(&self, payload: impl AsRef<[u8]>, header: &str, now: i64) -> Result<()> {
        let payload = payload.as_ref();

        // Fail closed on anything that does not parse.
        let parsed = parse_header(header).ok_or_else(|| {
            VerigateError::signature_verification(SignatureFailure::MalformedHeader)
        })?;

        // Unix seconds are never negative; a negative value is a forgery
        // or corruption, not a stale delivery.
        if parsed.timestamp < 0 {
            return Err(VerigateError::signature_verification(
                SignatureFailure::MalformedHeader,
            ));
        }

        // Reject both directions: replays of old deliveries and
        // future-dated timestamps from clock skew or forgery.
        let tolerance_seconds = self.tolerance.as_secs();
        if now.abs_diff(parsed.timestamp) > tolerance_seconds {
            return Err(VerigateError::signature_verification(
                SignatureFailure::TimestampOutOfTolerance {
                    timestamp: parsed.timestamp,
                    now,
                    tolerance_seconds,
                },
            ));
        }

        let expected = digest(self.secret.expose_secret(), parsed.timestamp, payload);

        // Any matching candidate accepts; a candidate that is not valid
        // hex is a non-match, not an abort, so a garbage entry cannot
        // mask a valid rotation signature.
        for candidate in &parsed.signatures {
            let Ok(provided) = hex::decode(candidate) else {
                continue;
            };
            if constant_time_compare(&expected, &provided) {
                return Ok(());
            }
        }

        Err(VerigateError::signature_verification(
            SignatureFailure::NoSignatureMatched,
        ))
    }

    /// Verify the payload, then parse it into a typed event.
    ///
    /// All-or-nothing: a signature failure yields
    /// [`VerigateError::SignatureVerification`] converted into `E`, and
    /// the payload is never handed to `parse`. Errors from `parse` itself
    /// propagate unmodified.
    pub fn construct_event<T, E, F>(
        &self,
        payload: impl AsRef<[u8]>,
        header: &str,
        parse: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&str) -> std::result::Result<T, E>,
        E: From<VerigateError>,
    {
        let payload = payload.as_ref();
        self.check(payload, header)?;
        parse(&String::from_utf8_lossy(payload))
    }

    /// Verify the payload and parse it as JSON.
    ///
    /// Convenience over [`construct_event`](Self::construct_event) for the
    /// common case; a payload that fails to deserialize after a successful
    /// signature check maps to a `Validation` error.
    pub fn construct_json_event<T: serde::de::DeserializeOwned>(
        &self,
        payload: impl AsRef<[u8]>,
        header: &str,
    ) -> Result<T> {
        let payload = payload.as_ref();
        self.check(payload, header)?;

        serde_json::from_slice(payload).map_err(|e| {
            // Log the detail internally, return a generic message to
            // avoid leaking payload contents.
            tracing::warn!(error = %e, "failed to parse verified webhook payload");
            VerigateError::validation("malformed JSON payload")
        })
    }
}

/// Constant-time comparison to prevent timing attacks
///
/// Uses the `subtle` crate which provides compiler-optimization-resistant
/// constant-time operations, so an attacker cannot guess a valid signature
/// byte-by-byte from response timing.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.ct_eq(b).into()
}
