//! Resilient stream supervision with liveness-based reconnection
//!
//! One supervisor owns at most one live subscription. Inbound messages bump a
//! last-interaction clock; a watchdog thread checks that clock every
//! `ping_delay` and, when the stream has been silent longer than
//! `inactivity_timeout`, tears the session down and re-issues the
//! last-known-good request. The reconnect is invisible to callers except for
//! the on-connect listeners firing again.
//!
//! Transport hard errors (authentication failures and the like) are NOT
//! auto-retried: they stop the watchdog, clear the session, and surface
//! through the on-error listeners. Reconnect storms against a permanently
//! broken credential would only mask the misconfiguration.

use crate::config::StreamConfig;
use crate::stream::session::StreamSession;
use crate::stream::tracker::SubscriptionResultTracker;
use crate::stream::types::{SubscriptionRequest, SubscriptionResult};
use crate::stream::StreamError;
use crate::transport::{StreamInbound, StreamObserver, StreamTransport, TransportError};
use crossbeam::channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Listener invoked when a subscription becomes (or becomes again) active
pub type ConnectListener = Arc<dyn Fn(&SubscriptionResult) + Send + Sync>;
/// Listener invoked for every inbound stream message
pub type ResponseListener<M> = Arc<dyn Fn(&M) + Send + Sync>;
/// Listener invoked with the accept/reject report of every acknowledgement
pub type ResultListener = Arc<dyn Fn(&SubscriptionResult) + Send + Sync>;
/// Listener invoked on transport hard errors
pub type ErrorListener = Arc<dyn Fn(&TransportError) + Send + Sync>;

struct Listeners<M> {
    on_connect: Vec<ConnectListener>,
    on_response: Vec<ResponseListener<M>>,
    on_result: Vec<ResultListener>,
    on_error: Vec<ErrorListener>,
}

impl<M> Default for Listeners<M> {
    fn default() -> Self {
        Self {
            on_connect: Vec::new(),
            on_response: Vec::new(),
            on_result: Vec::new(),
            on_error: Vec::new(),
        }
    }
}

/// Coarse supervisor state, derived from the session slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    /// No session (never subscribed, disconnected, or torn down by an error)
    Idle,
    /// Stream opened, awaiting the first successful acknowledgement
    Connecting,
    /// Subscription acknowledged, liveness watchdog running
    Active,
}

/// Counters exposed for observability and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    /// Inbound messages accepted from the current-generation stream
    pub messages: u64,
    /// Acknowledgement frames among them
    pub acks: u64,
    /// Liveness-triggered reconnects
    pub reconnects: u64,
    /// Watchdog threads started over the supervisor's lifetime
    pub watchdog_spawns: u64,
}

/// Builder for [`ResilientStreamSupervisor`]
///
/// Listeners are registered here, at construction time; they fire
/// synchronously on whichever thread delivers the event and must not block.
pub struct StreamSupervisorBuilder<M> {
    ping_delay: Duration,
    inactivity_timeout: Duration,
    listeners: Listeners<M>,
}

impl<M> StreamSupervisorBuilder<M> {
    pub fn new() -> Self {
        Self::from_config(&StreamConfig::default())
    }

    /// Take ping delay and inactivity timeout from ambient configuration
    pub fn from_config(config: &StreamConfig) -> Self {
        Self {
            ping_delay: config.ping_delay(),
            inactivity_timeout: config.inactivity_timeout(),
            listeners: Listeners::default(),
        }
    }

    pub fn ping_delay(mut self, ping_delay: Duration) -> Self {
        self.ping_delay = ping_delay;
        self
    }

    pub fn inactivity_timeout(mut self, inactivity_timeout: Duration) -> Self {
        self.inactivity_timeout = inactivity_timeout;
        self
    }

    pub fn add_on_connect_listener(
        mut self,
        listener: impl Fn(&SubscriptionResult) + Send + Sync + 'static,
    ) -> Self {
        self.listeners.on_connect.push(Arc::new(listener));
        self
    }

    pub fn add_on_response_listener(
        mut self,
        listener: impl Fn(&M) + Send + Sync + 'static,
    ) -> Self {
        self.listeners.on_response.push(Arc::new(listener));
        self
    }

    pub fn add_on_result_listener(
        mut self,
        listener: impl Fn(&SubscriptionResult) + Send + Sync + 'static,
    ) -> Self {
        self.listeners.on_result.push(Arc::new(listener));
        self
    }

    pub fn add_on_error_listener(
        mut self,
        listener: impl Fn(&TransportError) + Send + Sync + 'static,
    ) -> Self {
        self.listeners.on_error.push(Arc::new(listener));
        self
    }

    pub fn build<T>(self, transport: Arc<T>) -> ResilientStreamSupervisor<T>
    where
        T: StreamTransport<Msg = M>,
    {
        ResilientStreamSupervisor {
            inner: Arc::new(SupervisorInner {
                transport,
                ping_delay: self.ping_delay,
                inactivity_timeout: self.inactivity_timeout,
                listeners: self.listeners,
                tracker: SubscriptionResultTracker::new(),
                state: Mutex::new(SupervisorState {
                    session: None,
                    watchdog: None,
                    next_generation: 0,
                }),
                epoch: Instant::now(),
                last_interaction_ms: AtomicU64::new(0),
                messages: AtomicU64::new(0),
                acks: AtomicU64::new(0),
                reconnects: AtomicU64::new(0),
                watchdog_spawns: AtomicU64::new(0),
            }),
        }
    }
}

impl<M> Default for StreamSupervisorBuilder<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns zero-or-one server-push subscription and keeps it alive
pub struct ResilientStreamSupervisor<T: StreamTransport> {
    inner: Arc<SupervisorInner<T>>,
}

impl<T: StreamTransport> Clone for ResilientStreamSupervisor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: StreamTransport> ResilientStreamSupervisor<T> {
    pub fn builder() -> StreamSupervisorBuilder<T::Msg> {
        StreamSupervisorBuilder::new()
    }

    /// Open a subscription with `request`.
    ///
    /// Fails with [`StreamError::AlreadySubscribed`] if a session is live.
    /// Returns once the transport call is issued; the acknowledgement arrives
    /// asynchronously through the message path.
    pub fn subscribe(&self, request: SubscriptionRequest) -> Result<(), StreamError> {
        let mut state = self.inner.state.lock();
        if state.session.is_some() {
            return Err(StreamError::AlreadySubscribed);
        }
        SupervisorInner::open_session(&self.inner, &mut state, request)?;
        Ok(())
    }

    /// Cancel the watchdog, close the stream, and clear all session state.
    ///
    /// Idempotent: calling it when idle is a no-op. The watchdog is cancelled
    /// under the same lock that clears the session, so a concurrent liveness
    /// tick observes "no session" and stands down.
    pub fn disconnect(&self) {
        let mut state = self.inner.state.lock();
        let watchdog = state.watchdog.take();
        let session = state.session.take();
        drop(state);

        if let Some(session) = session {
            info!("Stream disconnected (generation {})", session.generation());
            session.close();
        }
        // dropping the cancel sender wakes the watchdog thread, which exits
        drop(watchdog);
    }

    pub fn status(&self) -> StreamStatus {
        let state = self.inner.state.lock();
        match state.session.as_ref() {
            None => StreamStatus::Idle,
            Some(session) if session.activated => StreamStatus::Active,
            Some(_) => StreamStatus::Connecting,
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.inner.state.lock().session.is_some()
    }

    pub fn is_watchdog_running(&self) -> bool {
        self.inner.state.lock().watchdog.is_some()
    }

    /// Last-known-good request of the live session, if any
    pub fn current_request(&self) -> Option<SubscriptionRequest> {
        self.inner
            .state
            .lock()
            .session
            .as_ref()
            .map(|s| s.request.clone())
    }

    pub fn stats(&self) -> SupervisorStats {
        SupervisorStats {
            messages: self.inner.messages.load(Ordering::Relaxed),
            acks: self.inner.acks.load(Ordering::Relaxed),
            reconnects: self.inner.reconnects.load(Ordering::Relaxed),
            watchdog_spawns: self.inner.watchdog_spawns.load(Ordering::Relaxed),
        }
    }

    /// Time since the last inbound message on the current stream
    pub fn idle_time(&self) -> Duration {
        self.inner.idle_time()
    }
}

struct SupervisorState<H> {
    session: Option<StreamSession<H>>,
    watchdog: Option<WatchdogHandle>,
    next_generation: u64,
}

struct WatchdogHandle {
    id: u64,
    // never sent on; dropping it disconnects the watchdog's receiver
    _cancel: Sender<()>,
}

struct SupervisorInner<T: StreamTransport> {
    transport: Arc<T>,
    ping_delay: Duration,
    inactivity_timeout: Duration,
    listeners: Listeners<T::Msg>,
    tracker: SubscriptionResultTracker,
    state: Mutex<SupervisorState<T::Handle>>,
    epoch: Instant,
    last_interaction_ms: AtomicU64,
    messages: AtomicU64,
    acks: AtomicU64,
    reconnects: AtomicU64,
    watchdog_spawns: AtomicU64,
}

impl<T: StreamTransport> SupervisorInner<T> {
    /// Record an interaction "now". `fetch_max` keeps the clock monotonically
    /// non-decreasing under concurrent writers.
    fn touch(&self) {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        self.last_interaction_ms.fetch_max(now_ms, Ordering::AcqRel);
    }

    fn idle_time(&self) -> Duration {
        let now_ms = self.epoch.elapsed().as_millis() as u64;
        let last_ms = self.last_interaction_ms.load(Ordering::Acquire);
        Duration::from_millis(now_ms.saturating_sub(last_ms))
    }

    /// Open a new stream and install it as the current session. Called with
    /// the state lock held so it is mutually exclusive with `disconnect` and
    /// concurrent subscribes.
    fn open_session(
        this: &Arc<Self>,
        state: &mut SupervisorState<T::Handle>,
        request: SubscriptionRequest,
    ) -> Result<(), TransportError> {
        state.next_generation += 1;
        let generation = state.next_generation;

        this.touch();
        let observer: Arc<dyn StreamObserver<T::Msg>> = Arc::new(SessionObserver {
            inner: Arc::clone(this),
            generation,
        });

        let handle = this.transport.open_stream(&request, observer)?;
        info!(
            "Stream subscription opened ({:?}, {} entries, generation {})",
            request.kind,
            request.entries.len(),
            generation
        );
        state.session = Some(StreamSession::new(request, handle, generation));
        Ok(())
    }

    /// Inbound message from the stream of `generation`
    fn handle_message(this: &Arc<Self>, generation: u64, message: T::Msg) {
        let mut activation: Option<SubscriptionResult> = None;
        let mut report: Option<SubscriptionResult> = None;

        {
            let mut state = this.state.lock();
            let session = match state.session.as_mut() {
                Some(s) if s.generation == generation => s,
                _ => {
                    debug!("Dropping message from stale stream (generation {})", generation);
                    return;
                }
            };

            this.touch();
            this.messages.fetch_add(1, Ordering::Relaxed);

            if let Some(ack) = message.subscription_ack() {
                this.acks.fetch_add(1, Ordering::Relaxed);
                let result = this.tracker.interpret(ack);

                // keep the live request narrowed to what the server accepted,
                // so a later reconnect re-issues only known-good entries
                session.request = this.tracker.reconcile(&session.request, &result);

                if !session.activated && result.has_accepted() {
                    session.activated = true;
                    activation = Some(result.clone());
                }
                report = Some(result);
            }
        }

        // listeners run outside the state lock
        if let Some(result) = &activation {
            Self::start_watchdog_if_needed(this);
            info!("Stream subscription active ({:?})", result.kind);
            for listener in &this.listeners.on_connect {
                listener(result);
            }
        }
        if let Some(result) = &report {
            for listener in &this.listeners.on_result {
                listener(result);
            }
        }
        for listener in &this.listeners.on_response {
            listener(&message);
        }
    }

    /// Transport hard error: tear down to Idle, surface to listeners, and do
    /// not auto-retry.
    fn handle_error(&self, generation: u64, error: TransportError) {
        {
            let mut state = self.state.lock();
            match state.session.as_ref() {
                Some(s) if s.generation == generation => {}
                _ => return,
            }
            state.watchdog = None;
            if let Some(session) = state.session.take() {
                session.close();
            }
        }

        error!("Stream transport failure: {}", error);
        for listener in &self.listeners.on_error {
            listener(&error);
        }
    }

    /// Server completed the stream: tear down to Idle
    fn handle_complete(&self, generation: u64) {
        let mut state = self.state.lock();
        match state.session.as_ref() {
            Some(s) if s.generation == generation => {}
            _ => return,
        }
        state.watchdog = None;
        if let Some(session) = state.session.take() {
            session.close();
        }
        drop(state);

        info!("Stream completed by server (generation {})", generation);
    }

    /// Start the liveness watchdog unless one is already running. Runs at
    /// most once per `subscribe`: reconnected sessions reuse the existing
    /// watchdog, so exactly one timer is ever active.
    fn start_watchdog_if_needed(this: &Arc<Self>) {
        let mut state = this.state.lock();
        if state.watchdog.is_some() || state.session.is_none() {
            return;
        }

        let id = this.watchdog_spawns.fetch_add(1, Ordering::Relaxed) + 1;
        let (cancel_tx, cancel_rx) = bounded::<()>(1);
        let inner = Arc::clone(this);
        let ping_delay = this.ping_delay;

        let spawned = thread::Builder::new()
            .name("bifrost-watchdog".to_string())
            .spawn(move || {
                debug!("Liveness watchdog started (id {})", id);
                loop {
                    match cancel_rx.recv_timeout(ping_delay) {
                        Err(RecvTimeoutError::Timeout) => {
                            if !SupervisorInner::check_liveness(&inner, id) {
                                break;
                            }
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                debug!("Liveness watchdog stopped (id {})", id);
            });

        match spawned {
            Ok(_) => {
                state.watchdog = Some(WatchdogHandle {
                    id,
                    _cancel: cancel_tx,
                });
            }
            Err(e) => {
                error!("Failed to spawn liveness watchdog: {}", e);
            }
        }
    }

    /// One watchdog tick. Returns false when the watchdog should stop.
    fn check_liveness(this: &Arc<Self>, watchdog_id: u64) -> bool {
        let mut state = this.state.lock();

        // only the registered watchdog may act; a replaced or cancelled one
        // stands down without touching shared state
        match state.watchdog.as_ref() {
            Some(w) if w.id == watchdog_id => {}
            _ => return false,
        }

        if state.session.is_none() {
            state.watchdog = None;
            return false;
        }

        let idle = this.idle_time();
        if idle <= this.inactivity_timeout {
            return true;
        }

        let Some(session) = state.session.take() else {
            state.watchdog = None;
            return false;
        };
        warn!(
            "Stream silent for {:?} (limit {:?}), reconnecting (generation {})",
            idle,
            this.inactivity_timeout,
            session.generation()
        );
        let request = session.request().clone();
        session.close();
        this.reconnects.fetch_add(1, Ordering::Relaxed);

        match Self::open_session(this, &mut state, request) {
            Ok(()) => true,
            Err(error) => {
                // treated as a hard error: no reconnect storm, surface it
                state.watchdog = None;
                drop(state);
                error!("Resubscribe after inactivity failed: {}", error);
                for listener in &this.listeners.on_error {
                    listener(&error);
                }
                false
            }
        }
    }
}

/// Per-session observer installed on the transport stream
struct SessionObserver<T: StreamTransport> {
    inner: Arc<SupervisorInner<T>>,
    generation: u64,
}

impl<T: StreamTransport> StreamObserver<T::Msg> for SessionObserver<T> {
    fn on_message(&self, message: T::Msg) {
        SupervisorInner::handle_message(&self.inner, self.generation, message);
    }

    fn on_error(&self, error: TransportError) {
        self.inner.handle_error(self.generation, error);
    }

    fn on_complete(&self) {
        self.inner.handle_complete(self.generation);
    }
}
