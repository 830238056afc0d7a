//! Server-push subscription handling
//!
//! Request/acknowledgement data model, the accept/reject tracker, and the
//! supervisor that keeps one subscription alive across silent-stream
//! reconnects.

pub mod session;
pub mod supervisor;
pub mod tracker;
pub mod types;

use thiserror::Error;

pub use session::StreamSession;
pub use supervisor::{
    ConnectListener, ErrorListener, ResilientStreamSupervisor, ResponseListener, ResultListener,
    StreamStatus, StreamSupervisorBuilder, SupervisorStats,
};
pub use tracker::SubscriptionResultTracker;
pub use types::{
    AckEntry, AckStatus, CandleInterval, EntryStatus, SubscriptionAck, SubscriptionEntry,
    SubscriptionKey, SubscriptionRequest, SubscriptionResult, TopicKind,
};

/// Errors surfaced by the stream supervisor's public API
#[derive(Debug, Error)]
pub enum StreamError {
    /// The supervisor already owns a live session; disconnect first
    #[error("a subscription is already active; disconnect before resubscribing")]
    AlreadySubscribed,

    /// The transport refused to open the stream
    #[error(transparent)]
    Transport(#[from] crate::transport::TransportError),
}
