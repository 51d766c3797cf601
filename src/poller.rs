//! Bounded polling of verification sessions.
//!
//! Drives repeated status retrieval against a gateway session until it
//! reaches a terminal state or a deadline elapses, so callers never write
//! the polling loop themselves. Retrievals are strictly sequential within
//! one `poll` call; independent calls share nothing and may run
//! concurrently.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep, sleep_until};

use crate::config::PollConfig;
use crate::error::{Result, VerigateError};
use crate::session::{SessionResult, SessionStatus};

/// One status retrieval against the gateway.
///
/// Represents a single HTTP GET (or equivalent) for the session resource.
/// Timeout and retry policy for the transport belong to the implementation,
/// not to the poller: errors returned here propagate out of `poll`
/// immediately and are never retried internally.
#[async_trait]
pub trait SessionRetriever: Send + Sync {
    async fn retrieve(&self, session_id: &str) -> Result<SessionResult>;
}

/// Adapter so plain async functions can serve as retrievers.
///
/// # Example
///
/// ```rust,ignore
/// let retriever = FnRetriever(|id: String| async move {
///     client.get_session(&id).await
/// });
/// poller.poll("vs_1", &retriever).await?;
/// ```
pub struct FnRetriever<F>(pub F);

#[async_trait]
impl<F, Fut> SessionRetriever for FnRetriever<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<SessionResult>> + Send + 'static,
{
    async fn retrieve(&self, session_id: &str) -> Result<SessionResult> {
        (self.0)(session_id.to_string()).await
    }
}

/// Polls a verification session until it reaches a terminal status.
///
/// Suspends only while awaiting the retriever and during the inter-poll
/// sleep. Each call owns its own transient state, so no locking is needed
/// across concurrent polls of different sessions.
///
/// # Example
///
/// ```rust,ignore
/// use verigate::{PollConfig, SessionPoller};
///
/// let poller = SessionPoller::with_config(
///     PollConfig::builder().interval_ms(1_000).max_duration_ms(60_000).build(),
/// )?;
/// let result = poller.poll("vs_1", &retriever).await?;
/// ```
pub struct SessionPoller {
    config: PollConfig,
}

impl SessionPoller {
    /// Poller with the default configuration (2 s interval, 5 min deadline).
    pub fn new() -> Self {
        Self {
            config: PollConfig::default(),
        }
    }

    /// Poller with an explicit configuration.
    ///
    /// # Errors
    /// Fails with a `Validation` error when the config is inconsistent.
    pub fn with_config(config: PollConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll until the session reaches a terminal status.
    ///
    /// Uses [`SessionStatus::is_terminal`] as the stopping predicate. On
    /// deadline, fails with [`VerigateError::Timeout`] carrying the session
    /// id, the last observed status (`"unknown"` if no retrieval ever
    /// succeeded), and the elapsed milliseconds. The deadline also bounds
    /// an in-flight retrieval, so a hung transport cannot stall the poll
    /// past `max_duration_ms`.
    pub async fn poll<R>(&self, session_id: &str, retriever: &R) -> Result<SessionResult>
    where
        R: SessionRetriever + ?Sized,
    {
        self.poll_with(session_id, retriever, SessionStatus::is_terminal, |_| {})
            .await
    }

    /// Poll with a custom terminal predicate and a per-result observer.
    ///
    /// `on_poll` runs for every retrieved result, terminal included; it is
    /// a side-effect hook and cannot alter control flow.
    pub async fn poll_with<R, T, C>(
        &self,
        session_id: &str,
        retriever: &R,
        is_terminal: T,
        on_poll: C,
    ) -> Result<SessionResult>
    where
        R: SessionRetriever + ?Sized,
        T: Fn(&SessionStatus) -> bool,
        C: FnMut(&SessionResult),
    {
        self.poll_inner(session_id, retriever, is_terminal, on_poll, None)
            .await
    }

    /// Poll until terminal, deadline, or a cancellation signal.
    ///
    /// Sending on (or dropping the sender of) the paired channel stops the
    /// loop at the next suspend point with [`VerigateError::Canceled`],
    /// instead of leaving the caller to abandon the future mid-flight.
    pub async fn poll_with_cancellation<R>(
        &self,
        session_id: &str,
        retriever: &R,
        cancel: mpsc::Receiver<()>,
    ) -> Result<SessionResult>
    where
        R: SessionRetriever + ?Sized,
    {
        self.poll_inner(
            session_id,
            retriever,
            SessionStatus::is_terminal,
            |_| {},
            Some(cancel),
        )
        .await
    }

    async fn poll_inner<R, T, C>(
        &self,
        session_id: &str,
        retriever: &R,
        is_terminal: T,
        mut on_poll: C,
        cancel: Option<mpsc::Receiver<()>>,
    ) -> Result<SessionResult>
    where
        R: SessionRetriever + ?Sized,
        T: Fn(&SessionStatus) -> bool,
        C: FnMut(&SessionResult),
    {
        let interval = self.config.interval();
        let max_duration = self.config.max_duration();
        let started = Instant::now();
        let deadline = started + max_duration;

        // Without a caller-supplied token, hold an internal sender so the
        // cancel arm never fires.
        let _keep_open;
        let mut cancel = match cancel {
            Some(rx) => {
                _keep_open = None;
                rx
            }
            None => {
                let (tx, rx) = mpsc::channel(1);
                _keep_open = Some(tx);
                rx
            }
        };

        let mut last_status: Option<SessionStatus> = None;

        loop {
            if started.elapsed() >= max_duration {
                return Err(timeout_error(session_id, &last_status, started.elapsed()));
            }

            let result = tokio::select! {
                _ = cancel.recv() => {
                    tracing::debug!(session_id, "session polling canceled");
                    return Err(VerigateError::canceled(session_id));
                }
                _ = sleep_until(deadline) => {
                    return Err(timeout_error(session_id, &last_status, started.elapsed()));
                }
                result = retriever.retrieve(session_id) => result?,
            };

            on_poll(&result);

            if is_terminal(&result.status) {
                tracing::debug!(
                    session_id,
                    status = %result.status,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "session reached terminal status"
                );
                return Ok(result);
            }

            tracing::trace!(session_id, status = %result.status, "session not yet terminal");
            last_status = Some(result.status);

            // Never sleep past the deadline; the next loop iteration
            // reports the timeout.
            let pause = interval.min(max_duration.saturating_sub(started.elapsed()));
            tokio::select! {
                _ = cancel.recv() => {
                    tracing::debug!(session_id, "session polling canceled");
                    return Err(VerigateError::canceled(session_id));
                }
                _ = sleep(pause) => {}
            }
        }
    }
}

impl Default for SessionPoller {
    fn default() -> Self {
        Self::new()
    }
}

fn timeout_error(
    session_id: &str,
    last_status: &Option<SessionStatus>,
    elapsed: Duration,
) -> VerigateError {
    let last = last_status
        .as_ref()
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::warn!(
        session_id,
        last_status = %last,
        elapsed_ms = elapsed.as_millis() as u64,
        "session polling deadline exceeded"
    );
    VerigateError::timeout(session_id, last, elapsed.as_millis() as u64)
}
