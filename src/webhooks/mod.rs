//! Webhook handling for gateway callbacks.
//!
//! Provides replay-resistant signature verification, idempotency checking,
//! and typed event dispatch for the asynchronous results the verification
//! gateway pushes to your endpoint.

pub mod handler;
pub mod idempotency;
pub mod verification;

pub use handler::{DispatchOutcome, WebhookDispatcher, WebhookEvent, WebhookHandler};
pub use idempotency::{IdempotencyStore, MemoryIdempotencyStore};
pub use verification::{DEFAULT_TOLERANCE, WebhookVerifier};
