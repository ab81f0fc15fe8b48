// Capture broker tests: one device shared across subscribers, released
// when the last handle goes away.

mod support;

use std::sync::Arc;
use std::time::Duration;
use support::{wait_until, EventLog, FakeCaptureFactory};
use voicelink::audio::{CaptureBroker, CaptureConfig};
use voicelink::error::ErrorCode;
use voicelink::logging::Logger;

fn broker() -> (CaptureBroker, Arc<support::CaptureCounters>) {
    let factory = FakeCaptureFactory::new(EventLog::default());
    let counters = Arc::clone(&factory.counters);
    let broker = CaptureBroker::new(
        Box::new(factory),
        CaptureConfig {
            buffer_duration_ms: 10,
            ..CaptureConfig::default()
        },
        Arc::new(Logger::default()),
    );
    (broker, counters)
}

#[tokio::test]
async fn second_subscriber_shares_the_running_backend() {
    let (broker, counters) = broker();

    let first = broker.acquire().await.expect("first acquire");
    let second = broker.acquire().await.expect("second acquire");

    assert_eq!(counters.created(), 1);
    assert_eq!(counters.started(), 1);
    assert_eq!(broker.subscriber_count().await, 2);

    drop(first);
    drop(second);
}

#[tokio::test]
async fn frames_fan_out_to_every_subscriber() {
    let (broker, _counters) = broker();

    let mut first = broker.acquire().await.unwrap();
    let mut second = broker.acquire().await.unwrap();

    let a = tokio::time::timeout(Duration::from_secs(2), first.recv())
        .await
        .expect("first subscriber should receive a frame")
        .expect("stream open");
    let b = tokio::time::timeout(Duration::from_secs(2), second.recv())
        .await
        .expect("second subscriber should receive a frame")
        .expect("stream open");

    assert_eq!(a.sample_rate, 16000);
    assert_eq!(b.channels, 1);
    assert!(!a.samples.is_empty());
}

#[tokio::test]
async fn backend_stops_when_the_last_handle_drops() {
    let (broker, counters) = broker();

    let first = broker.acquire().await.unwrap();
    let second = broker.acquire().await.unwrap();

    drop(first);
    // One subscriber remains; the device must stay open.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(counters.stopped(), 0);

    drop(second);
    let c = Arc::clone(&counters);
    assert!(
        wait_until(|| c.stopped() == 1, Duration::from_secs(2)).await,
        "backend should stop once the last subscriber detaches"
    );
    assert_eq!(broker.subscriber_count().await, 0);
}

#[tokio::test]
async fn reacquire_after_release_opens_a_fresh_backend() {
    let (broker, counters) = broker();

    let handle = broker.acquire().await.unwrap();
    drop(handle);
    let c = Arc::clone(&counters);
    assert!(wait_until(|| c.stopped() == 1, Duration::from_secs(2)).await);

    let _handle = broker.acquire().await.unwrap();
    assert_eq!(counters.created(), 2);
    assert_eq!(counters.started(), 2);
}

#[tokio::test]
async fn factory_failure_surfaces_as_a_classified_error() {
    let factory = FakeCaptureFactory::new(EventLog::default());
    factory.fail_next_create("audio input permission denied");
    let broker = CaptureBroker::new(
        Box::new(factory),
        CaptureConfig::default(),
        Arc::new(Logger::default()),
    );

    let err = broker.acquire().await.err().expect("create should fail");
    assert_eq!(err.code(), ErrorCode::PermissionDenied);
    assert_eq!(broker.subscriber_count().await, 0);
}
