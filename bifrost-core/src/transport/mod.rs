//! RPC transport boundary
//!
//! The connector core never builds channels, attaches authentication headers,
//! or encodes wire messages itself. It drives the platform's RPC client
//! through the small trait surface in this module; an adapter over the real
//! transport implements these traits and delivers inbound events on its own
//! network-callback threads.

pub mod error;

pub use error::{StatusCode, TransportError, RETRYABLE_INTERNAL_APP_CODE};

use crate::stream::types::{SubscriptionAck, SubscriptionRequest};
use std::fmt;
use std::sync::Arc;

/// Identifier of one remote operation, used to resolve its retry policy
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    service: String,
    method: String,
    full_name: String,
}

impl MethodRef {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        let service = service.into();
        let method = method.into();
        let full_name = format!("{}/{}", service, method);
        Self {
            service,
            method,
            full_name,
        }
    }

    /// Owning service name (fallback key for policy lookup)
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Stable call identifier, `Service/Method`. Precomputed at construction
    /// so policy resolution never allocates.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Inbound message on a server-push stream.
///
/// The supervisor treats stream messages as opaque payloads except for
/// subscription acknowledgement frames, which it must recognize to track
/// accepted entries and drive its own lifecycle.
pub trait StreamInbound: Send + 'static {
    /// The acknowledgement frame carried by this message, if it is one
    fn subscription_ack(&self) -> Option<&SubscriptionAck>;
}

/// Typed callback interface the transport drives for one open stream.
///
/// All three callbacks fire on whichever thread the transport delivers
/// events from; implementations must not block indefinitely.
pub trait StreamObserver<M>: Send + Sync {
    fn on_message(&self, message: M);
    fn on_error(&self, error: TransportError);
    fn on_complete(&self);
}

/// Handle to one open server-push stream
pub trait StreamHandle: Send + 'static {
    /// Close the underlying stream. Must be idempotent.
    fn close(&mut self);
}

/// Opens server-push subscriptions against the remote platform.
///
/// `open_stream` returns once the call is issued; acknowledgements and data
/// arrive later through the observer. Implementations must deliver observer
/// events from a different thread, never synchronously from inside
/// `open_stream` (the supervisor holds its session lock across the call).
pub trait StreamTransport: Send + Sync + 'static {
    type Msg: StreamInbound;
    type Handle: StreamHandle;

    fn open_stream(
        &self,
        request: &SubscriptionRequest,
        observer: Arc<dyn StreamObserver<Self::Msg>>,
    ) -> Result<Self::Handle, TransportError>;
}
