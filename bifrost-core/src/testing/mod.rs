//! Test doubles and fixture builders
//!
//! A scriptable in-process stream transport plus small constructors for
//! errors, requests, and acknowledgements. Used by the unit tests in this
//! crate and by the integration tests under `tests/`.

pub mod helpers;
pub mod mock_transport;

pub use helpers::{
    ack, ack_entry, internal_with_app_code, invalid_argument, resource_exhausted,
    retryable_internal, success_ack, trades_request, unavailable, ScriptedCall,
};
pub use mock_transport::{MockMessage, MockStreamHandle, MockStreamTransport};
