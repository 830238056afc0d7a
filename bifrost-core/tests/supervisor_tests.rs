//! Liveness and reconnection tests for the stream supervisor
//!
//! These run against real timers with short ping/timeout settings, so they
//! poll with generous deadlines instead of asserting exact timings.

use bifrost_core::stream::{StreamStatus, StreamSupervisorBuilder};
use bifrost_core::testing::{
    ack, success_ack, trades_request, unavailable, MockMessage, MockStreamTransport,
};
use bifrost_core::stream::types::AckStatus;
use bifrost_core::TopicKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PING: Duration = Duration::from_millis(25);
const TIMEOUT: Duration = Duration::from_millis(100);
const DEADLINE: Duration = Duration::from_secs(3);

fn init_tracing() {
    bifrost_core::utils::init_logger("warn", false);
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + DEADLINE;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn test_silent_stream_reconnects_with_narrowed_request() {
    init_tracing();
    let transport = Arc::new(MockStreamTransport::new());
    let connects = Arc::new(AtomicUsize::new(0));

    let c = connects.clone();
    let supervisor = StreamSupervisorBuilder::new()
        .ping_delay(PING)
        .inactivity_timeout(TIMEOUT)
        .add_on_connect_listener(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .build(Arc::clone(&transport));

    supervisor.subscribe(trades_request(&["a", "b"])).unwrap();
    transport.deliver(
        0,
        MockMessage::Ack(ack(
            TopicKind::Trades,
            &[("a", AckStatus::Success), ("b", AckStatus::InstrumentNotFound)],
        )),
    );
    assert_eq!(connects.load(Ordering::SeqCst), 1);

    // stay silent: the watchdog must tear down and resubscribe
    assert!(transport.wait_for_opens(2, DEADLINE), "no reconnect happened");
    assert!(transport.is_closed(0));

    // the re-issued request carries only the accepted entry
    assert_eq!(transport.request(1), Some(trades_request(&["a"])));

    // acknowledging the new stream re-fires the connect listeners
    transport.deliver(1, MockMessage::Ack(success_ack(TopicKind::Trades, &["a"])));
    assert!(wait_until(|| connects.load(Ordering::SeqCst) >= 2));

    let stats = supervisor.stats();
    assert!(stats.reconnects >= 1);
    // reconnects reuse the original watchdog
    assert_eq!(stats.watchdog_spawns, 1);

    supervisor.disconnect();
}

#[test]
fn test_traffic_prevents_reconnect() {
    init_tracing();
    let transport = Arc::new(MockStreamTransport::new());
    let supervisor = StreamSupervisorBuilder::new()
        .ping_delay(PING)
        .inactivity_timeout(TIMEOUT)
        .build(Arc::clone(&transport));

    supervisor.subscribe(trades_request(&["a"])).unwrap();
    transport.deliver(0, MockMessage::Ack(success_ack(TopicKind::Trades, &["a"])));

    // keep the stream chatty for several timeout windows
    for i in 0..20 {
        transport.deliver(0, MockMessage::Data(i));
        thread::sleep(Duration::from_millis(20));
    }

    assert_eq!(transport.open_count(), 1);
    assert_eq!(supervisor.stats().reconnects, 0);
    assert_eq!(supervisor.status(), StreamStatus::Active);

    supervisor.disconnect();
}

#[test]
fn test_reconnect_open_failure_surfaces_as_hard_error() {
    init_tracing();
    let transport = Arc::new(MockStreamTransport::new());
    let errors = Arc::new(AtomicUsize::new(0));

    let e = errors.clone();
    let supervisor = StreamSupervisorBuilder::new()
        .ping_delay(PING)
        .inactivity_timeout(TIMEOUT)
        .add_on_error_listener(move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        })
        .build(Arc::clone(&transport));

    supervisor.subscribe(trades_request(&["a"])).unwrap();
    transport.deliver(0, MockMessage::Ack(success_ack(TopicKind::Trades, &["a"])));

    transport.fail_next_open(unavailable());

    // silence triggers a resubscribe, which fails and must not be retried
    assert!(wait_until(|| errors.load(Ordering::SeqCst) >= 1));
    assert_eq!(supervisor.status(), StreamStatus::Idle);
    assert!(!supervisor.is_watchdog_running());
    assert_eq!(transport.open_count(), 1);

    // the failure count stays at one: no reconnect storm
    thread::sleep(TIMEOUT * 3);
    assert_eq!(errors.load(Ordering::SeqCst), 1);

    // the supervisor is reusable afterwards
    supervisor.subscribe(trades_request(&["a"])).unwrap();
    assert_eq!(transport.open_count(), 2);
    supervisor.disconnect();
}

#[test]
fn test_disconnect_stops_the_watchdog() {
    init_tracing();
    let transport = Arc::new(MockStreamTransport::new());
    let supervisor = StreamSupervisorBuilder::new()
        .ping_delay(PING)
        .inactivity_timeout(TIMEOUT)
        .build(Arc::clone(&transport));

    supervisor.subscribe(trades_request(&["a"])).unwrap();
    transport.deliver(0, MockMessage::Ack(success_ack(TopicKind::Trades, &["a"])));
    assert!(supervisor.is_watchdog_running());

    supervisor.disconnect();
    assert!(transport.is_closed(0));

    // well past the inactivity timeout, nothing reconnects
    thread::sleep(TIMEOUT * 3);
    assert_eq!(transport.open_count(), 1);
    assert_eq!(supervisor.status(), StreamStatus::Idle);
}

#[test]
fn test_repeated_silence_keeps_single_watchdog() {
    init_tracing();
    let transport = Arc::new(MockStreamTransport::new());
    let supervisor = StreamSupervisorBuilder::new()
        .ping_delay(PING)
        .inactivity_timeout(TIMEOUT)
        .build(Arc::clone(&transport));

    supervisor.subscribe(trades_request(&["a"])).unwrap();
    transport.deliver(0, MockMessage::Ack(success_ack(TopicKind::Trades, &["a"])));

    // two consecutive silent windows, each ending in a reconnect
    assert!(transport.wait_for_opens(2, DEADLINE));
    transport.deliver(1, MockMessage::Ack(success_ack(TopicKind::Trades, &["a"])));
    assert!(transport.wait_for_opens(3, DEADLINE));

    let stats = supervisor.stats();
    assert!(stats.reconnects >= 2);
    assert_eq!(stats.watchdog_spawns, 1);

    supervisor.disconnect();
}
