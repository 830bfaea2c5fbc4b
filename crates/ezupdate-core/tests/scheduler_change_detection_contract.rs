//! Contract Test: Change Detection
//!
//! Constraints verified:
//! - The first poll always publishes
//! - An unchanged address is not published again unless `max_interval` expired
//! - A failed update does not advance the confirmed address
//! - Resolve failures are survived and reported once per streak
//! - One-shot runs only need an address when the driver does
//!
//! If this test fails, the scheduler either hammers the provider with
//! redundant updates or silently loses an address change.

mod common;

use common::*;
use ezupdate_core::{AgentEvent, DaemonScheduler, Dispatcher, EventSink, SignalFlag};
use std::net::Ipv4Addr;
use std::time::Duration;

const A: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 10);
const B: Ipv4Addr = Ipv4Addr::new(192, 0, 2, 20);

fn dispatcher() -> Dispatcher {
    Dispatcher::new(Box::new(NullTransport::new())).with_retry_pause(Duration::from_millis(1))
}

#[tokio::test]
async fn publishes_only_on_change() {
    let signals = SignalFlag::new();
    let resolver = ScriptedResolver::new(vec![Some(A), Some(A), Some(B)], signals.clone());
    let driver = ScriptedDriver::succeeding();

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        fast_config(),
        signals,
    );

    tokio::time::timeout(Duration::from_secs(5), scheduler.run())
        .await
        .expect("scheduler should stop once the script is exhausted")
        .expect("clean shutdown");

    assert_eq!(
        driver.update_call_count(),
        2,
        "one update for the first poll, one for the A -> B change"
    );
    assert_eq!(driver.addresses(), vec![A.to_string(), B.to_string()]);
    assert_eq!(scheduler.state().last_address, Some(B));
}

#[tokio::test]
async fn republishes_unchanged_address_after_max_interval() {
    let signals = SignalFlag::new();
    let resolver = ScriptedResolver::new(vec![Some(A), Some(A)], signals.clone());
    let driver = ScriptedDriver::succeeding();

    let mut config = fast_config();
    config.max_interval = Duration::from_millis(1);
    config.update_period = Duration::from_millis(20);

    let mut scheduler =
        DaemonScheduler::new(Box::new(resolver), &driver, dispatcher(), config, signals);

    tokio::time::timeout(Duration::from_secs(5), scheduler.run())
        .await
        .expect("scheduler should stop")
        .expect("clean shutdown");

    assert_eq!(
        driver.update_call_count(),
        2,
        "a stale update must be refreshed even without a change"
    );
}

#[tokio::test]
async fn failed_update_is_retried_on_next_poll() {
    let signals = SignalFlag::new();
    let resolver = ScriptedResolver::new(vec![Some(A), Some(A)], signals.clone());
    let driver = ScriptedDriver::failing_first(1);

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        fast_config(),
        signals,
    );

    tokio::time::timeout(Duration::from_secs(5), scheduler.run())
        .await
        .expect("scheduler should stop")
        .expect("clean shutdown");

    assert_eq!(
        driver.update_call_count(),
        2,
        "the same address must be published again after a failure"
    );
    assert_eq!(scheduler.state().last_address, Some(A));
}

#[tokio::test]
async fn resolve_failures_are_survived_and_reported_once() {
    let signals = SignalFlag::new();
    let resolver = ScriptedResolver::new(vec![None, None, Some(A)], signals.clone());
    let driver = ScriptedDriver::succeeding();
    let (events, mut rx) = EventSink::channel(64);

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        fast_config(),
        signals,
    )
    .with_events(events);

    tokio::time::timeout(Duration::from_secs(5), scheduler.run())
        .await
        .expect("scheduler should stop")
        .expect("clean shutdown");

    let events = drain_events(&mut rx);
    let unresolved = events
        .iter()
        .filter(|e| matches!(e, AgentEvent::InterfaceUnresolved { .. }))
        .count();

    // Two streaks: the first two polls, then the exhausted script
    assert_eq!(unresolved, 2, "one report per failure streak");
    assert!(events.contains(&AgentEvent::InterfaceRecovered {
        interface: "test0".to_string(),
        address: A,
    }));
    assert_eq!(driver.update_call_count(), 1);
}

#[tokio::test]
async fn one_shot_uses_address_override_without_resolving() {
    let resolver = ScriptedResolver::constant(B);
    let resolve_calls = resolver.call_counter();
    let driver = ScriptedDriver::succeeding();

    let mut config = fast_config();
    config.address = A.to_string();

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        config,
        SignalFlag::new(),
    );

    scheduler.run_once().await.expect("one-shot update succeeds");

    assert_eq!(resolve_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(driver.addresses(), vec![A.to_string()]);
}

#[tokio::test]
async fn one_shot_resolves_and_retries() {
    let resolver = ScriptedResolver::constant(B);
    let driver = ScriptedDriver::failing_first(1);

    let mut config = fast_config();
    config.retries = 2;

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        config,
        SignalFlag::new(),
    );

    scheduler.run_once().await.expect("second attempt succeeds");

    assert_eq!(driver.addresses(), vec![B.to_string(), B.to_string()]);
    assert_eq!(scheduler.state().last_address, Some(B));
}

#[tokio::test]
async fn one_shot_fails_when_address_is_required_but_unresolvable() {
    let signals = SignalFlag::new();
    let resolver = ScriptedResolver::new(vec![None], signals.clone());
    let driver = ScriptedDriver::succeeding();

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        fast_config(),
        signals,
    );

    let err = scheduler.run_once().await.unwrap_err();
    assert_eq!(err.kind(), ezupdate_core::ErrorKind::InterfaceResolution);
    assert_eq!(driver.update_call_count(), 0);
}

#[tokio::test]
async fn one_shot_lets_server_detect_address_when_unresolvable() {
    let signals = SignalFlag::new();
    let resolver = ScriptedResolver::new(vec![None], signals.clone());
    let driver = ScriptedDriver::succeeding().address_optional();

    let mut scheduler = DaemonScheduler::new(
        Box::new(resolver),
        &driver,
        dispatcher(),
        fast_config(),
        signals,
    );

    scheduler
        .run_once()
        .await
        .expect("an unresolvable interface is not fatal when the server detects the address");

    assert_eq!(driver.update_call_count(), 1);
    assert_eq!(driver.addresses(), vec![String::new()], "address left empty");
    assert_eq!(scheduler.state().last_address, None);
}
