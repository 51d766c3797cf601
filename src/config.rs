use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VerigateError};
use crate::utils::get_env_with_prefix;

/// Webhook verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Replay tolerance window in seconds, applied in both directions
    /// around the signed timestamp
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: u64,

    /// Shared webhook secret, provisioned out of band.
    ///
    /// Held as a [`SecretString`] so it never shows up in debug output or
    /// serialized config. Load it from the environment or a secret store,
    /// never from a config file.
    #[serde(skip)]
    pub secret: Option<SecretString>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            tolerance_seconds: default_tolerance_seconds(),
            secret: None,
        }
    }
}

impl WebhookConfig {
    /// Create a new WebhookConfig builder
    pub fn builder() -> WebhookConfigBuilder {
        WebhookConfigBuilder::new()
    }

    /// Load webhook configuration from environment variables
    ///
    /// Reads `VERIGATE_WEBHOOK_SECRET` and
    /// `VERIGATE_WEBHOOK_TOLERANCE_SECONDS` (unprefixed fallbacks apply).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secret) = get_env_with_prefix("WEBHOOK_SECRET") {
            config.secret = Some(secret.into());
        }

        if let Some(tolerance) = get_env_with_prefix("WEBHOOK_TOLERANCE_SECONDS") {
            if let Ok(val) = tolerance.parse() {
                config.tolerance_seconds = val;
            }
        }

        config
    }
}

/// Builder for WebhookConfig
#[must_use = "builder does nothing until you call build()"]
pub struct WebhookConfigBuilder {
    config: WebhookConfig,
}

impl WebhookConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: WebhookConfig::default(),
        }
    }

    pub fn tolerance_seconds(mut self, seconds: u64) -> Self {
        self.config.tolerance_seconds = seconds;
        self
    }

    pub fn secret(mut self, secret: impl Into<SecretString>) -> Self {
        self.config.secret = Some(secret.into());
        self
    }

    pub fn build(self) -> WebhookConfig {
        self.config
    }
}

impl Default for WebhookConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Session polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Pause between consecutive status retrievals, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Overall polling deadline, in milliseconds
    #[serde(default = "default_max_duration_ms")]
    pub max_duration_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_duration_ms: default_max_duration_ms(),
        }
    }
}

impl PollConfig {
    /// Create a new PollConfig builder
    pub fn builder() -> PollConfigBuilder {
        PollConfigBuilder::new()
    }

    /// Load polling configuration from environment variables
    ///
    /// Reads `VERIGATE_POLL_INTERVAL_MS` and
    /// `VERIGATE_POLL_MAX_DURATION_MS` (unprefixed fallbacks apply).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(interval) = get_env_with_prefix("POLL_INTERVAL_MS") {
            if let Ok(val) = interval.parse() {
                config.interval_ms = val;
            }
        }

        if let Some(max_duration) = get_env_with_prefix("POLL_MAX_DURATION_MS") {
            if let Ok(val) = max_duration.parse() {
                config.max_duration_ms = val;
            }
        }

        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(VerigateError::validation_for(
                "interval_ms",
                "poll interval must be greater than zero",
            ));
        }

        if self.max_duration_ms < self.interval_ms {
            return Err(VerigateError::validation_for(
                "max_duration_ms",
                "poll deadline must be at least one interval",
            ));
        }

        Ok(())
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.interval_ms)
    }

    pub fn max_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.max_duration_ms)
    }
}

/// Builder for PollConfig
#[must_use = "builder does nothing until you call build()"]
pub struct PollConfigBuilder {
    config: PollConfig,
}

impl PollConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: PollConfig::default(),
        }
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.config.interval_ms = ms;
        self
    }

    pub fn max_duration_ms(mut self, ms: u64) -> Self {
        self.config.max_duration_ms = ms;
        self
    }

    pub fn build(self) -> PollConfig {
        self.config
    }
}

impl Default for PollConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tolerance_seconds() -> u64 {
    300
}

fn default_interval_ms() -> u64 {
    2_000
}

fn default_max_duration_ms() -> u64 {
    300_000
}
