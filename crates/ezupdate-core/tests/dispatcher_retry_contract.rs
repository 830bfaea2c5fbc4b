//! Contract Test: Dispatcher-Owned Retry Policy
//!
//! Constraints verified:
//! - Up to `n` attempts, stopping at the first success
//! - A pause between attempts, never before the first or after the last
//! - Preconditions checked once, before any attempt
//!
//! Boundaries:
//! - ✅ DISPATCHER: counts attempts and pauses
//! - ❌ DRIVER: performs exactly one exchange per call

mod common;

use common::*;
use ezupdate_core::{AgentEvent, Dispatcher, ErrorKind, EventSink, UpdateConfig};
use std::time::{Duration, Instant};

fn pauses(events: &[AgentEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AgentEvent::RetryPause { .. }))
        .count()
}

fn attempts(events: &[AgentEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, AgentEvent::AttemptStarted { .. }))
        .count()
}

#[tokio::test]
async fn succeeds_on_third_attempt_with_two_pauses() {
    let driver = ScriptedDriver::failing_first(2);
    let (events, mut rx) = EventSink::channel(32);
    let dispatcher = Dispatcher::new(Box::new(NullTransport::new()))
        .with_retry_pause(Duration::from_millis(10))
        .with_events(events);

    let started = Instant::now();
    dispatcher
        .run_with_retries(&driver, &fast_config(), 3)
        .await
        .expect("third attempt succeeds");

    assert_eq!(driver.update_call_count(), 3, "driver should be called exactly 3 times");
    assert!(
        started.elapsed() >= Duration::from_millis(20),
        "two pauses should have elapsed"
    );

    let events = drain_events(&mut rx);
    assert_eq!(attempts(&events), 3);
    assert_eq!(pauses(&events), 2, "exactly two pauses between three attempts");
    assert!(events.contains(&AgentEvent::UpdateSucceeded {
        address: None,
        attempts: 3
    }));
}

#[tokio::test]
async fn stops_at_first_success() {
    let driver = ScriptedDriver::succeeding();
    let (events, mut rx) = EventSink::channel(32);
    let dispatcher = Dispatcher::new(Box::new(NullTransport::new()))
        .with_retry_pause(Duration::from_millis(10))
        .with_events(events);

    dispatcher
        .run_with_retries(&driver, &fast_config(), 5)
        .await
        .expect("first attempt succeeds");

    assert_eq!(driver.update_call_count(), 1);
    assert_eq!(pauses(&drain_events(&mut rx)), 0, "no pause after a success");
}

#[tokio::test]
async fn exhausted_retries_return_last_error_without_trailing_pause() {
    let driver = ScriptedDriver::failing_first(10);
    let (events, mut rx) = EventSink::channel(32);
    let dispatcher = Dispatcher::new(Box::new(NullTransport::new()))
        .with_retry_pause(Duration::from_millis(1))
        .with_events(events);

    let err = dispatcher
        .run_with_retries(&driver, &fast_config(), 3)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(driver.update_call_count(), 3);

    let events = drain_events(&mut rx);
    assert_eq!(pauses(&events), 2, "no pause after the last attempt");
    assert!(matches!(events.last(), Some(AgentEvent::UpdateFailed { .. })));
}

#[tokio::test]
async fn preconditions_fail_before_any_attempt() {
    let driver = ScriptedDriver::succeeding();
    let dispatcher = Dispatcher::new(Box::new(NullTransport::new()));

    let err = dispatcher
        .run_with_retries(&driver, &UpdateConfig::default(), 3)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(driver.update_call_count(), 0, "no attempt on a bad config");
}

#[tokio::test]
async fn run_once_makes_a_single_attempt() {
    let driver = ScriptedDriver::failing_first(1);
    let dispatcher =
        Dispatcher::new(Box::new(NullTransport::new())).with_retry_pause(Duration::from_millis(1));

    assert!(dispatcher.run_once(&driver, &fast_config()).await.is_err());
    assert_eq!(driver.update_call_count(), 1);
}
