use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ambient connector configuration
///
/// Owned by the embedding application; this core only reads the knobs below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorConfig {
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub stream: StreamConfig,
}

/// Defaults applied to calls without an explicit retry policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts for calls resolved to the synthesized default policy
    #[serde(default = "default_max_attempts")]
    pub default_max_attempts: u32,

    /// Wait between attempts when the server supplies no rate-limit hint (ms)
    #[serde(default = "default_wait_ms")]
    pub default_wait_ms: u64,
}

impl RetryConfig {
    pub fn default_wait(&self) -> Duration {
        Duration::from_millis(self.default_wait_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            default_max_attempts: default_max_attempts(),
            default_wait_ms: default_wait_ms(),
        }
    }
}

/// Stream supervision knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Liveness check period (ms)
    #[serde(default = "default_ping_delay_ms")]
    pub ping_delay_ms: u64,

    /// Silence longer than this marks the stream dead (ms)
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,
}

impl StreamConfig {
    pub fn ping_delay(&self) -> Duration {
        Duration::from_millis(self.ping_delay_ms)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ping_delay_ms: default_ping_delay_ms(),
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_wait_ms() -> u64 {
    1_000
}

fn default_ping_delay_ms() -> u64 {
    5_000
}

fn default_inactivity_timeout_ms() -> u64 {
    15_000
}
