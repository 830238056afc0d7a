//! Retry policies and resilient unary callers
//!
//! A three-level policy registry (call > service > default) plus blocking and
//! async call decorators that execute an invocation under the resolved
//! policy, waiting out server rate-limit hints between attempts.

pub mod caller;
pub mod policy;
pub mod registry;

pub use caller::{ResilientAsyncUnaryCaller, ResilientUnaryCaller};
pub use policy::{retry_wait, RetryPolicy};
pub use registry::{ConfigError, RetryPolicyRegistry, RetryPolicyRegistryBuilder};
