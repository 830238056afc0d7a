//! In-process stream transport for tests
//!
//! Records every `open_stream` call and lets tests drive the recorded
//! observers by hand: deliver messages, inject errors, complete streams, or
//! script the next open to fail. Observer callbacks are always invoked with
//! the mock's own lock released, so tests never deadlock against supervisor
//! internals that reopen streams from inside a callback.

use crate::stream::types::{SubscriptionAck, SubscriptionRequest};
use crate::transport::{
    StreamHandle, StreamInbound, StreamObserver, StreamTransport, TransportError,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Message type flowing through the mock stream
#[derive(Debug, Clone)]
pub enum MockMessage {
    /// Subscription acknowledgement frame
    Ack(SubscriptionAck),
    /// Opaque data frame carrying a test-chosen payload
    Data(u64),
}

impl StreamInbound for MockMessage {
    fn subscription_ack(&self) -> Option<&SubscriptionAck> {
        match self {
            MockMessage::Ack(ack) => Some(ack),
            MockMessage::Data(_) => None,
        }
    }
}

/// Handle returned by the mock; flips a shared flag on close
#[derive(Debug)]
pub struct MockStreamHandle {
    closed: Arc<AtomicBool>,
}

impl StreamHandle for MockStreamHandle {
    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

struct MockStream {
    request: SubscriptionRequest,
    observer: Arc<dyn StreamObserver<MockMessage>>,
    closed: Arc<AtomicBool>,
}

#[derive(Default)]
struct MockState {
    streams: Vec<MockStream>,
    fail_next: VecDeque<TransportError>,
}

/// Scriptable [`StreamTransport`] double
#[derive(Default)]
pub struct MockStreamTransport {
    state: Mutex<MockState>,
}

impl MockStreamTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open_stream` call fail with `error`. Queued failures
    /// are consumed in order before opens succeed again.
    pub fn fail_next_open(&self, error: TransportError) {
        self.state.lock().fail_next.push_back(error);
    }

    /// Number of successful `open_stream` calls so far
    pub fn open_count(&self) -> usize {
        self.state.lock().streams.len()
    }

    /// Request the i-th open was issued with
    pub fn request(&self, index: usize) -> Option<SubscriptionRequest> {
        self.state
            .lock()
            .streams
            .get(index)
            .map(|s| s.request.clone())
    }

    pub fn last_request(&self) -> Option<SubscriptionRequest> {
        self.state.lock().streams.last().map(|s| s.request.clone())
    }

    /// Whether the i-th stream's handle has been closed
    pub fn is_closed(&self, index: usize) -> bool {
        self.state
            .lock()
            .streams
            .get(index)
            .map(|s| s.closed.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Observer registered on the i-th stream
    pub fn observer(&self, index: usize) -> Option<Arc<dyn StreamObserver<MockMessage>>> {
        self.state
            .lock()
            .streams
            .get(index)
            .map(|s| Arc::clone(&s.observer))
    }

    /// Deliver a message on the i-th stream as if the server pushed it
    pub fn deliver(&self, index: usize, message: MockMessage) {
        if let Some(observer) = self.observer(index) {
            observer.on_message(message);
        }
    }

    /// Fail the i-th stream with a transport error
    pub fn fail_stream(&self, index: usize, error: TransportError) {
        if let Some(observer) = self.observer(index) {
            observer.on_error(error);
        }
    }

    /// Complete the i-th stream as if the server finished it
    pub fn complete_stream(&self, index: usize) {
        if let Some(observer) = self.observer(index) {
            observer.on_complete();
        }
    }

    /// Poll until at least `count` opens happened, up to `timeout`. Returns
    /// whether the target was reached. Used by tests that wait on the
    /// watchdog thread.
    pub fn wait_for_opens(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.open_count() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(2));
        }
    }
}

impl StreamTransport for MockStreamTransport {
    type Msg = MockMessage;
    type Handle = MockStreamHandle;

    fn open_stream(
        &self,
        request: &SubscriptionRequest,
        observer: Arc<dyn StreamObserver<MockMessage>>,
    ) -> Result<MockStreamHandle, TransportError> {
        let mut state = self.state.lock();
        if let Some(error) = state.fail_next.pop_front() {
            return Err(error);
        }

        let closed = Arc::new(AtomicBool::new(false));
        state.streams.push(MockStream {
            request: request.clone(),
            observer,
            closed: Arc::clone(&closed),
        });
        Ok(MockStreamHandle { closed })
    }
}
