//! Subscription domain model
//!
//! Requests name the instruments/topics a caller wants pushed; the server
//! answers each request with an acknowledgement listing, per entry, whether
//! the subscription was accepted. Entries are identified by instrument id
//! plus whatever extra dimension the topic kind distinguishes by (candle
//! interval, order book depth).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of server-push subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicKind {
    Candles,
    OrderBook,
    Trades,
    LastPrice,
}

/// Candle aggregation interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleInterval {
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
    OneHour,
    OneDay,
}

/// One entry of a subscription request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionEntry {
    /// Instrument identifier
    pub instrument_id: String,
    /// Candle interval (meaningful for `Candles` subscriptions)
    #[serde(default)]
    pub interval: Option<CandleInterval>,
    /// Order book depth (meaningful for `OrderBook` subscriptions)
    #[serde(default)]
    pub depth: Option<u32>,
}

impl SubscriptionEntry {
    pub fn instrument(instrument_id: impl Into<String>) -> Self {
        Self {
            instrument_id: instrument_id.into(),
            interval: None,
            depth: None,
        }
    }

    pub fn with_interval(mut self, interval: CandleInterval) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Identifying key of this entry under the given topic kind.
    ///
    /// Candle subscriptions are distinguished by interval and order book
    /// subscriptions by depth; for every other kind the instrument id alone
    /// identifies the entry.
    pub fn key(&self, kind: TopicKind) -> SubscriptionKey {
        SubscriptionKey {
            instrument_id: self.instrument_id.clone(),
            interval: match kind {
                TopicKind::Candles => self.interval,
                _ => None,
            },
            depth: match kind {
                TopicKind::OrderBook => self.depth,
                _ => None,
            },
        }
    }
}

/// One server-push subscription request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub kind: TopicKind,
    pub entries: Vec<SubscriptionEntry>,
}

impl SubscriptionRequest {
    pub fn new(kind: TopicKind, entries: Vec<SubscriptionEntry>) -> Self {
        Self { kind, entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifying keys of all entries, in request order
    pub fn keys(&self) -> Vec<SubscriptionKey> {
        self.entries.iter().map(|e| e.key(self.kind)).collect()
    }
}

/// Identifying key of one subscription entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionKey {
    pub instrument_id: String,
    pub interval: Option<CandleInterval>,
    pub depth: Option<u32>,
}

/// Per-entry status code carried in an acknowledgement frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Success,
    InstrumentNotFound,
    IntervalNotSupported,
    DepthNotSupported,
    Internal,
}

impl AckStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, AckStatus::Success)
    }
}

/// One entry of an acknowledgement frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckEntry {
    pub instrument_id: String,
    pub interval: Option<CandleInterval>,
    pub depth: Option<u32>,
    pub status: AckStatus,
}

impl AckEntry {
    pub fn key(&self, kind: TopicKind) -> SubscriptionKey {
        SubscriptionKey {
            instrument_id: self.instrument_id.clone(),
            interval: match kind {
                TopicKind::Candles => self.interval,
                _ => None,
            },
            depth: match kind {
                TopicKind::OrderBook => self.depth,
                _ => None,
            },
        }
    }
}

/// Acknowledgement frame the server sends in answer to a subscription request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionAck {
    pub kind: TopicKind,
    pub entries: Vec<AckEntry>,
}

/// Outcome of one subscription entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    Accepted,
    Rejected(AckStatus),
}

impl EntryStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EntryStatus::Accepted)
    }
}

/// Per-entry accept/reject report produced from one acknowledgement frame.
/// Built fresh for every ack, never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionResult {
    pub kind: TopicKind,
    pub status_by_key: HashMap<SubscriptionKey, EntryStatus>,
}

impl SubscriptionResult {
    /// Whether at least one entry was accepted
    pub fn has_accepted(&self) -> bool {
        self.status_by_key.values().any(|s| s.is_accepted())
    }

    pub fn is_accepted(&self, key: &SubscriptionKey) -> bool {
        matches!(self.status_by_key.get(key), Some(EntryStatus::Accepted))
    }

    pub fn accepted_keys(&self) -> Vec<&SubscriptionKey> {
        self.status_by_key
            .iter()
            .filter(|(_, s)| s.is_accepted())
            .map(|(k, _)| k)
            .collect()
    }

    pub fn rejected_keys(&self) -> Vec<&SubscriptionKey> {
        self.status_by_key
            .iter()
            .filter(|(_, s)| !s.is_accepted())
            .map(|(k, _)| k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candle_key_keeps_interval() {
        let entry = SubscriptionEntry::instrument("BBG000B9XRY4")
            .with_interval(CandleInterval::OneMinute)
            .with_depth(10);

        let key = entry.key(TopicKind::Candles);
        assert_eq!(key.interval, Some(CandleInterval::OneMinute));
        assert_eq!(key.depth, None);
    }

    #[test]
    fn test_order_book_key_keeps_depth() {
        let entry = SubscriptionEntry::instrument("BBG000B9XRY4")
            .with_interval(CandleInterval::OneMinute)
            .with_depth(10);

        let key = entry.key(TopicKind::OrderBook);
        assert_eq!(key.interval, None);
        assert_eq!(key.depth, Some(10));
    }

    #[test]
    fn test_trades_key_is_id_only() {
        let entry = SubscriptionEntry::instrument("BBG000B9XRY4")
            .with_interval(CandleInterval::OneHour)
            .with_depth(20);

        let key = entry.key(TopicKind::Trades);
        assert_eq!(key.interval, None);
        assert_eq!(key.depth, None);
        assert_eq!(key.instrument_id, "BBG000B9XRY4");
    }

    #[test]
    fn test_entry_usable_as_hash_key() {
        use std::collections::HashSet;

        let entries = [
            SubscriptionEntry::instrument("a"),
            SubscriptionEntry::instrument("a").with_interval(CandleInterval::OneMinute),
            SubscriptionEntry::instrument("b"),
        ];
        let set: HashSet<&SubscriptionEntry> = entries.iter().collect();

        assert_eq!(set.len(), 3);
        assert!(set.contains(&SubscriptionEntry::instrument("a")));
        assert!(!set.contains(&SubscriptionEntry::instrument("c")));
    }

    #[test]
    fn test_request_keys_in_order() {
        let request = SubscriptionRequest::new(
            TopicKind::Trades,
            vec![
                SubscriptionEntry::instrument("a"),
                SubscriptionEntry::instrument("b"),
            ],
        );
        let keys = request.keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].instrument_id, "a");
        assert_eq!(keys[1].instrument_id, "b");
    }
}
