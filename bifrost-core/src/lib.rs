//! Bifrost Core - Resilience Layer for Remote Trading-Platform RPC
//!
//! Bifrost sits between application code and a remote trading platform's RPC
//! surface. It does not speak the wire protocol itself; a transport
//! implementation does. Bifrost adds the behavior transports leave out:
//!
//! ## Core Modules
//! - `retry`: policy registry (call > service > default) plus blocking and
//!   async unary callers that classify failures and wait out rate limits
//! - `stream`: server-push subscription model, accept/reject tracking, and a
//!   supervisor that reconnects silent streams from a liveness watchdog
//! - `transport`: the error model and the traits a transport implements
//! - `connector`: assembly point tying config, policies, and transport
//!   together
//! - `config`: serde-backed configuration with startup validation
//! - `testing`: scriptable mock transport and fixture builders
//!
//! ## Resilience Model
//! - Unary calls retry only transient failures (UNAVAILABLE,
//!   RESOURCE_EXHAUSTED, and one whitelisted INTERNAL application code),
//!   honoring server rate-limit reset hints between attempts
//! - Streams reconnect only on silence: a watchdog compares the
//!   last-interaction clock against the inactivity timeout and re-issues the
//!   last-known-good request. Hard transport errors are surfaced, never
//!   retried

pub mod config;
pub mod connector;
pub mod retry;
pub mod stream;
pub mod testing;
pub mod transport;
pub mod utils;

// Re-export the types most integrations touch
pub use config::{ConnectorConfig, RetryConfig, StreamConfig};
pub use connector::Connector;
pub use retry::{
    ConfigError, ResilientAsyncUnaryCaller, ResilientUnaryCaller, RetryPolicy,
    RetryPolicyRegistry, RetryPolicyRegistryBuilder,
};
pub use stream::{
    ResilientStreamSupervisor, StreamError, StreamStatus, StreamSupervisorBuilder,
    SubscriptionAck, SubscriptionEntry, SubscriptionRequest, SubscriptionResult, TopicKind,
};
pub use transport::{
    MethodRef, StatusCode, StreamHandle, StreamInbound, StreamObserver, StreamTransport,
    TransportError,
};

// Re-export error types
pub use anyhow::{Error, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ConnectorConfig, RetryConfig, StreamConfig};
    pub use crate::connector::Connector;
    pub use crate::retry::{
        ResilientAsyncUnaryCaller, ResilientUnaryCaller, RetryPolicy, RetryPolicyRegistry,
    };
    pub use crate::stream::{
        ResilientStreamSupervisor, StreamStatus, StreamSupervisorBuilder, SubscriptionEntry,
        SubscriptionRequest, TopicKind,
    };
    pub use crate::transport::{MethodRef, StatusCode, StreamTransport, TransportError};
    pub use crate::{Error, Result};
}
