//! Retry policy registry with three-level resolution
//!
//! Policies are looked up by exact call identifier first, then by owning
//! service, then the mandatory default. The registry is built once at
//! startup, immutable afterwards, and shared by all callers without
//! synchronization.

use crate::config::RetryConfig;
use crate::retry::policy::RetryPolicy;
use crate::transport::MethodRef;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while assembling the registry
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The same key was registered twice
    #[error("retry policy already registered for '{key}'")]
    DuplicatePolicy { key: String },
}

/// Resolves a retry policy for a call identifier
#[derive(Debug)]
pub struct RetryPolicyRegistry {
    default: RetryPolicy,
    by_service: HashMap<String, RetryPolicy>,
    by_method: HashMap<String, RetryPolicy>,
}

impl RetryPolicyRegistry {
    pub fn builder() -> RetryPolicyRegistryBuilder {
        RetryPolicyRegistryBuilder::new()
    }

    /// Resolve the policy for a call: exact method match, else service
    /// match, else the default. Never fails.
    pub fn resolve(&self, method: &MethodRef) -> &RetryPolicy {
        self.by_method
            .get(method.full_name())
            .or_else(|| self.by_service.get(method.service()))
            .unwrap_or(&self.default)
    }

    pub fn default_policy(&self) -> &RetryPolicy {
        &self.default
    }
}

/// Builder for [`RetryPolicyRegistry`]
///
/// Each registration rejects duplicate keys at build time so misconfiguration
/// surfaces at startup, never inside a call.
#[derive(Debug, Default)]
pub struct RetryPolicyRegistryBuilder {
    default: Option<RetryPolicy>,
    by_service: HashMap<String, RetryPolicy>,
    by_method: HashMap<String, RetryPolicy>,
}

impl RetryPolicyRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default policy applied when no method or service override
    /// matches
    pub fn with_default_retry_config(mut self, policy: RetryPolicy) -> Result<Self, ConfigError> {
        if self.default.is_some() {
            return Err(ConfigError::DuplicatePolicy {
                key: "default".to_string(),
            });
        }
        self.default = Some(policy);
        Ok(self)
    }

    /// Register a policy for every call of one service
    pub fn add_service_retry_config(
        mut self,
        service: impl Into<String>,
        policy: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let key = service.into();
        if self.by_service.contains_key(&key) {
            return Err(ConfigError::DuplicatePolicy { key });
        }
        self.by_service.insert(key, policy);
        Ok(self)
    }

    /// Register a policy for one specific call
    pub fn add_method_retry_config(
        mut self,
        method: &MethodRef,
        policy: RetryPolicy,
    ) -> Result<Self, ConfigError> {
        let key = method.full_name();
        if self.by_method.contains_key(key) {
            return Err(ConfigError::DuplicatePolicy {
                key: key.to_string(),
            });
        }
        self.by_method.insert(key.to_string(), policy);
        Ok(self)
    }

    /// Build the registry. When no default policy was supplied, one is
    /// synthesized from the ambient retry configuration so resolution can
    /// never come up empty.
    pub fn build(self, config: &RetryConfig) -> RetryPolicyRegistry {
        let default = self
            .default
            .unwrap_or_else(|| RetryPolicy::new(config.default_max_attempts, config.default_wait()));

        RetryPolicyRegistry {
            default,
            by_service: self.by_service,
            by_method: self.by_method,
        }
    }
}
