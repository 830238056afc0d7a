//! Mutable state of one active server-push subscription
//!
//! A session is created on `subscribe`, replaced wholesale on every
//! reconnect, and destroyed on explicit `disconnect`. Exactly one supervisor
//! owns it, behind the supervisor's state lock.

use crate::stream::types::SubscriptionRequest;
use crate::transport::StreamHandle;

/// One live subscription: last-acknowledged request plus transport handle
#[derive(Debug)]
pub struct StreamSession<H> {
    /// Outgoing request, narrowed as acknowledgements arrive
    pub(crate) request: SubscriptionRequest,
    /// Handle to the open transport stream
    pub(crate) handle: H,
    /// Monotonic tag distinguishing this session from torn-down predecessors
    pub(crate) generation: u64,
    /// Set once the first successful acknowledgement arrives
    pub(crate) activated: bool,
}

impl<H: StreamHandle> StreamSession<H> {
    pub(crate) fn new(request: SubscriptionRequest, handle: H, generation: u64) -> Self {
        Self {
            request,
            handle,
            generation,
            activated: false,
        }
    }

    /// Last-known-good request (reflects entries the server accepted)
    pub fn request(&self) -> &SubscriptionRequest {
        &self.request
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Close the transport stream and consume the session
    pub(crate) fn close(mut self) {
        self.handle.close();
    }
}
