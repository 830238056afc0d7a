//! Connector configuration
//!
//! Plain data with validation. Loading from files, CLI flags, or environment
//! is the embedding application's business; this module only defines the
//! knobs the resilience core reads and checks them for consistency.

pub mod types;

pub use types::*;

use anyhow::{Context, Result};

impl ConnectorConfig {
    /// Parse configuration from a JSON document; missing fields take their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: ConnectorConfig =
            serde_json::from_str(json).context("Failed to parse connector configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retry.default_max_attempts == 0 {
            anyhow::bail!("retry.default_max_attempts must be at least 1");
        }

        if self.stream.ping_delay_ms == 0 {
            anyhow::bail!("stream.ping_delay_ms must be nonzero");
        }

        if self.stream.inactivity_timeout_ms <= self.stream.ping_delay_ms {
            anyhow::bail!(
                "stream.inactivity_timeout_ms ({}) must exceed stream.ping_delay_ms ({})",
                self.stream.inactivity_timeout_ms,
                self.stream.ping_delay_ms
            );
        }

        Ok(())
    }
}
