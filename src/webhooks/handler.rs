use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::webhooks::IdempotencyStore;

/// Trait representing a gateway webhook event
pub trait WebhookEvent: DeserializeOwned + Send + Sync {
    /// Get the unique event ID for idempotency checking
    fn event_id(&self) -> &str;

    /// Get the event type/name (e.g. "verification.completed")
    fn event_type(&self) -> &str;
}

/// Trait for handling webhook events
///
/// Implement this for each type of gateway event you want to handle.
///
/// # Example
///
/// ```rust,ignore
/// use verigate::webhooks::{WebhookEvent, WebhookHandler};
///
/// #[derive(Deserialize)]
/// struct SessionCompletedEvent {
///     id: String,
///     event_type: String,
///     session_id: String,
/// }
///
/// impl WebhookEvent for SessionCompletedEvent {
///     fn event_id(&self) -> &str {
///         &self.id
///     }
///
///     fn event_type(&self) -> &str {
///         &self.event_type
///     }
/// }
///
/// struct SessionCompletedHandler {
///     store: AppStore,
/// }
///
/// #[async_trait]
/// impl WebhookHandler<SessionCompletedEvent> for SessionCompletedHandler {
///     async fn handle(&self, event: &SessionCompletedEvent) -> Result<()> {
///         // Record the verification outcome
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait WebhookHandler<E: WebhookEvent>: Send + Sync {
    /// Handle the webhook event
    async fn handle(&self, event: &E) -> Result<()>;

    /// Optional: Validate the event before handling
    async fn validate(&self, _event: &E) -> Result<()> {
        Ok(())
    }

    /// Optional: Handle errors that occur during processing
    async fn on_error(&self, event: &E, error: &crate::error::VerigateError) {
        tracing::error!(
            event_id = event.event_id(),
            event_type = event.event_type(),
            error = %error,
            "Webhook processing failed"
        );
    }
}

/// Outcome of dispatching one verified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Event was handled.
    Processed,
    /// Event was already handled earlier (gateway redelivery).
    AlreadyProcessed,
}

/// Dispatches verified events to their handlers, exactly once per event id.
///
/// Gateways redeliver webhooks until they see a 2xx, so the same event can
/// arrive several times; the idempotency store suppresses the duplicates.
pub struct WebhookDispatcher;

impl WebhookDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Process a verified webhook event with the given handler
    pub async fn process<E, H>(
        &self,
        event: &E,
        handler: &H,
        idempotency_store: &dyn IdempotencyStore,
    ) -> Result<DispatchOutcome>
    where
        E: WebhookEvent,
        H: WebhookHandler<E>,
    {
        if idempotency_store.is_processed(event.event_id()).await? {
            tracing::debug!(
                event_id = event.event_id(),
                "Skipping already processed event"
            );
            return Ok(DispatchOutcome::AlreadyProcessed);
        }

        handler.validate(event).await?;

        match handler.handle(event).await {
            Ok(()) => {
                idempotency_store
                    .mark_processed(event.event_id().to_string())
                    .await?;

                tracing::info!(
                    event_id = event.event_id(),
                    event_type = event.event_type(),
                    "Webhook processed successfully"
                );

                Ok(DispatchOutcome::Processed)
            }
            Err(e) => {
                handler.on_error(event, &e).await;
                Err(e)
            }
        }
    }
}

impl Default for WebhookDispatcher {
    fn default() -> Self {
        Self::new()
    }
}
