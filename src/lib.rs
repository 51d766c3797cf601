//! Verigate - server-side toolkit for identity verification gateways
//!
//! Verigate lets a relying application delegate identity/age verification
//! to a remote gateway: it authenticates the signed webhooks the gateway
//! pushes back, and polls a session until it reaches a terminal result.
//!
//! # Features
//!
//! - **Signature codec**: deterministic HMAC-SHA256 signing and
//!   `t=...,v1=...` header parsing
//! - **Webhook verification**: replay-resistant, rotation-tolerant checks
//!   with constant-time comparison, plus typed event construction
//! - **Session polling**: bounded, cancellable waiting for a terminal
//!   session status without hand-written loops
//! - **Event dispatch**: idempotent routing of verified events to handlers
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use verigate::{SessionPoller, WebhookConfig, webhooks::WebhookVerifier};
//!
//! #[tokio::main]
//! async fn main() -> verigate::Result<()> {
//!     verigate::init_tracing();
//!
//!     let config = WebhookConfig::from_env();
//!     let verifier = WebhookVerifier::from_config(&config)?;
//!
//!     // In your webhook endpoint:
//!     // let event: MyEvent = verifier.construct_json_event(body, header)?;
//!
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod poller;
pub mod session;
pub mod signature;
pub mod utils;
pub mod webhooks;

// Re-exports for public API
pub use config::{PollConfig, PollConfigBuilder, WebhookConfig, WebhookConfigBuilder};
pub use error::{Result, SignatureFailure, VerigateError};
pub use poller::{FnRetriever, SessionPoller, SessionRetriever};
pub use session::{SessionResult, SessionStatus};
pub use signature::{MAX_SIGNATURE_LENGTH, SignedHeader, build_header, parse_header, sign};
pub use webhooks::WebhookVerifier;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging with sensible defaults
///
/// This should be called early in your application, typically in main().
///
/// # Environment Variables
///
/// - `RUST_LOG`: Set log level (e.g., "info", "debug", "verigate=debug")
/// - `VERIGATE_LOG_JSON`: Set to "true" for JSON formatted logs
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_logs = std::env::var("VERIGATE_LOG_JSON")
        .map(|v| v.parse::<bool>().unwrap_or(false))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
