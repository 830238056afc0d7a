//! Fixture builders shared across tests

use crate::stream::types::{
    AckEntry, AckStatus, SubscriptionAck, SubscriptionEntry, SubscriptionRequest, TopicKind,
};
use crate::transport::{StatusCode, TransportError, RETRYABLE_INTERNAL_APP_CODE};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub fn unavailable() -> TransportError {
    TransportError::new(StatusCode::Unavailable).with_message("connection reset")
}

/// Rate-limited error carrying a reset hint in whole seconds
pub fn resource_exhausted(reset_secs: u64) -> TransportError {
    TransportError::new(StatusCode::ResourceExhausted)
        .with_message("rate limit exceeded")
        .with_ratelimit_reset(reset_secs)
}

pub fn internal_with_app_code(app_code: u32) -> TransportError {
    TransportError::new(StatusCode::Internal)
        .with_message("internal error")
        .with_app_code(app_code)
}

/// The one internal error flavor that is retryable
pub fn retryable_internal() -> TransportError {
    internal_with_app_code(RETRYABLE_INTERNAL_APP_CODE)
}

pub fn invalid_argument() -> TransportError {
    TransportError::new(StatusCode::InvalidArgument).with_message("bad instrument id")
}

/// Trades subscription for the given instrument ids
pub fn trades_request(instruments: &[&str]) -> SubscriptionRequest {
    SubscriptionRequest::new(
        TopicKind::Trades,
        instruments
            .iter()
            .map(|id| SubscriptionEntry::instrument(*id))
            .collect(),
    )
}

pub fn ack_entry(instrument_id: &str, status: AckStatus) -> AckEntry {
    AckEntry {
        instrument_id: instrument_id.to_string(),
        interval: None,
        depth: None,
        status,
    }
}

/// Acknowledgement with one entry per `(instrument, status)` pair
pub fn ack(kind: TopicKind, entries: &[(&str, AckStatus)]) -> SubscriptionAck {
    SubscriptionAck {
        kind,
        entries: entries
            .iter()
            .map(|(id, status)| ack_entry(id, *status))
            .collect(),
    }
}

/// Acknowledgement accepting every listed instrument
pub fn success_ack(kind: TopicKind, instruments: &[&str]) -> SubscriptionAck {
    ack(
        kind,
        &instruments
            .iter()
            .map(|id| (*id, AckStatus::Success))
            .collect::<Vec<_>>(),
    )
}

/// Unary invocation that fails with scripted errors before succeeding
///
/// Clones share the script and the call counter, so one instance can be
/// handed to a retry caller while the test keeps another to assert on.
pub struct ScriptedCall<T: Clone> {
    script: Arc<Mutex<VecDeque<TransportError>>>,
    value: T,
    calls: Arc<AtomicU32>,
}

impl<T: Clone> Clone for ScriptedCall<T> {
    fn clone(&self) -> Self {
        Self {
            script: Arc::clone(&self.script),
            value: self.value.clone(),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T: Clone> ScriptedCall<T> {
    /// Fail with each error in `errors` in order, then return `value` forever
    pub fn new(value: T, errors: Vec<TransportError>) -> Self {
        Self {
            script: Arc::new(Mutex::new(errors.into())),
            value,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn invoke(&self) -> Result<T, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(error) => Err(error),
            None => Ok(self.value.clone()),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}
