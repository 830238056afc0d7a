//! Connector: the assembly point for resilient callers and supervisors
//!
//! Owns the validated configuration, the retry policy registry, and the
//! transport. Everything it hands out shares those through `Arc`, so one
//! connector can mint any number of callers and supervisors over the same
//! connection.

use crate::config::ConnectorConfig;
use crate::retry::{ResilientAsyncUnaryCaller, ResilientUnaryCaller, RetryPolicyRegistry};
use crate::stream::{ResilientStreamSupervisor, StreamSupervisorBuilder};
use crate::transport::StreamTransport;
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub struct Connector<T: StreamTransport> {
    config: ConnectorConfig,
    registry: Arc<RetryPolicyRegistry>,
    transport: Arc<T>,
}

impl<T: StreamTransport> Connector<T> {
    /// Assemble a connector. Rejects invalid configuration up front so the
    /// callers and supervisors it produces never have to re-validate.
    pub fn new(
        config: ConnectorConfig,
        registry: RetryPolicyRegistry,
        transport: Arc<T>,
    ) -> Result<Self> {
        config.validate()?;
        info!(
            "Connector ready (default retry: {} attempts, stream ping {:?})",
            config.retry.default_max_attempts,
            config.stream.ping_delay()
        );
        Ok(Self {
            config,
            registry: Arc::new(registry),
            transport,
        })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RetryPolicyRegistry> {
        &self.registry
    }

    /// Blocking unary caller sharing this connector's policy registry
    pub fn unary_caller(&self) -> ResilientUnaryCaller {
        ResilientUnaryCaller::new(Arc::clone(&self.registry))
    }

    /// Async unary caller sharing this connector's policy registry
    pub fn async_unary_caller(&self) -> ResilientAsyncUnaryCaller {
        ResilientAsyncUnaryCaller::new(Arc::clone(&self.registry))
    }

    /// Supervisor builder pre-loaded with this connector's stream timings
    pub fn stream_builder(&self) -> StreamSupervisorBuilder<T::Msg> {
        StreamSupervisorBuilder::from_config(&self.config.stream)
    }

    /// Finish a builder against this connector's transport
    pub fn stream_supervisor(
        &self,
        builder: StreamSupervisorBuilder<T::Msg>,
    ) -> ResilientStreamSupervisor<T> {
        builder.build(Arc::clone(&self.transport))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RetryConfig, StreamConfig};
    use crate::testing::MockStreamTransport;

    fn connector(config: ConnectorConfig) -> Result<Connector<MockStreamTransport>> {
        let registry = RetryPolicyRegistry::builder().build(&config.retry);
        Connector::new(config, registry, Arc::new(MockStreamTransport::new()))
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = ConnectorConfig {
            retry: RetryConfig::default(),
            stream: StreamConfig {
                ping_delay_ms: 10_000,
                inactivity_timeout_ms: 5_000,
            },
        };
        assert!(connector(config).is_err());
    }

    #[test]
    fn test_builders_inherit_config() {
        let config = ConnectorConfig {
            retry: RetryConfig::default(),
            stream: StreamConfig {
                ping_delay_ms: 100,
                inactivity_timeout_ms: 300,
            },
        };
        let connector = connector(config).unwrap();

        let supervisor = connector.stream_supervisor(connector.stream_builder());
        // idle_time starts from construction; just exercise the wiring
        let _ = supervisor.idle_time();
        assert!(!supervisor.is_subscribed());

        let _sync = connector.unary_caller();
        let _async = connector.async_unary_caller();
    }
}
