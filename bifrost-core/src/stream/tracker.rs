//! Subscription acknowledgement interpretation
//!
//! Turns raw acknowledgement frames into per-entry accept/reject reports and
//! narrows an outgoing request to the entries the server actually accepted,
//! so a reconnect never re-asks for entries the server already refused.

use crate::stream::types::{
    EntryStatus, SubscriptionAck, SubscriptionRequest, SubscriptionResult,
};
use std::collections::HashMap;
use tracing::warn;

/// Interprets acknowledgement frames and refines the live request
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionResultTracker;

impl SubscriptionResultTracker {
    pub fn new() -> Self {
        Self
    }

    /// Pure mapping from an acknowledgement frame to per-entry status,
    /// keyed by each entry's identifying key.
    pub fn interpret(&self, ack: &SubscriptionAck) -> SubscriptionResult {
        let mut status_by_key = HashMap::with_capacity(ack.entries.len());
        for entry in &ack.entries {
            let key = entry.key(ack.kind);
            let status = if entry.status.is_success() {
                EntryStatus::Accepted
            } else {
                warn!(
                    "Subscription entry rejected ({:?} {}): {:?}",
                    ack.kind, key.instrument_id, entry.status
                );
                EntryStatus::Rejected(entry.status)
            };
            status_by_key.insert(key, status);
        }
        SubscriptionResult {
            kind: ack.kind,
            status_by_key,
        }
    }

    /// Narrow `previous` based on what the server reported.
    ///
    /// Entries the result marks rejected are dropped; entries the result does
    /// not mention are kept unchanged. When no refinement applies the
    /// returned request equals `previous`.
    pub fn reconcile(
        &self,
        previous: &SubscriptionRequest,
        result: &SubscriptionResult,
    ) -> SubscriptionRequest {
        if previous.kind != result.kind {
            return previous.clone();
        }

        let entries = previous
            .entries
            .iter()
            .filter(|entry| {
                !matches!(
                    result.status_by_key.get(&entry.key(previous.kind)),
                    Some(EntryStatus::Rejected(_))
                )
            })
            .cloned()
            .collect();

        SubscriptionRequest {
            kind: previous.kind,
            entries,
        }
    }
}
