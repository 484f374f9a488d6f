//! Architectural Contract Test: Shutdown Determinism
//!
//! A shutdown request is honored at the next checkpoint: cycle start, before
//! each record, before each request, and during the period wait. A request
//! already in flight completes, nothing new is started afterwards.

mod common;

use common::*;
use recupdater_core::{CancellationToken, EngineEvent, UpdateOutcome};
use std::time::Duration;

#[tokio::test]
async fn run_returns_promptly_after_cancel() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new();
    let config = test_config(false);
    let shutdown = CancellationToken::new();

    let (mut engine, mut events) = engine_with(
        transport,
        &provider,
        vec![record("example.com", &["home"])],
        &config,
        shutdown.clone(),
    );

    let worker = tokio::spawn(async move {
        engine.run().await.unwrap();
        engine
    });

    // Let the first cycle finish, then interrupt the 120s period wait
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    let engine = tokio::time::timeout(Duration::from_secs(2), worker)
        .await
        .expect("engine must stop well before the period elapses")
        .unwrap();

    assert!(engine.store().get(0).unwrap().is_fresh());
    assert_eq!(provider.call_count(), 1);

    let events = drain(&mut events);
    assert_eq!(events.first(), Some(&EngineEvent::Started { records_count: 1 }));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::Stopped {
            reason: "Shutdown signal".to_string()
        })
    );
}

#[tokio::test]
async fn cancel_mid_record_stops_after_inflight_request() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new();
    let config = test_config(false);
    let shutdown = CancellationToken::new();
    provider.cancel_during_call(1, shutdown.clone());

    let (mut engine, mut events) = engine_with(
        transport,
        &provider,
        vec![
            record("example.com", &["home", "www"]),
            record("example.org", &["nas"]),
        ],
        &config,
        shutdown,
    );

    let report = engine.run_cycle().await;

    // The in-flight request completed, "www" was never attempted
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::new("example.com", "home", "1.2.3.4")]
    );
    assert_eq!(report.outcome_of(0), Some(&UpdateOutcome::Canceled));
    assert_eq!(report.outcome_of(1), Some(&UpdateOutcome::Canceled));
    assert_eq!(engine.store().fresh_count(), 0);

    let events = drain(&mut events);
    assert!(events.contains(&EngineEvent::UpdateCanceled {
        domain: "example.com".to_string()
    }));
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, EngineEvent::UpdateFailed { .. })),
        "shutdown is not a failure"
    );
    // The record that never started produces no events
    assert!(!events.iter().any(|e| matches!(
        e,
        EngineEvent::UpdateStarted { domain, .. } | EngineEvent::UpdateCanceled { domain }
            if domain == "example.org"
    )));
}

#[tokio::test]
async fn rejection_during_shutdown_is_canceled() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new();
    let config = test_config(false);
    let shutdown = CancellationToken::new();
    provider.reject("home.example.com", "Unknown error");
    provider.cancel_during_call(1, shutdown.clone());

    let (mut engine, _events) = engine_with(
        transport,
        &provider,
        vec![record("example.com", &["home"])],
        &config,
        shutdown,
    );

    let report = engine.run_cycle().await;

    assert_eq!(report.outcome_of(0), Some(&UpdateOutcome::Canceled));
}

#[tokio::test]
async fn cancel_before_cycle_does_nothing() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), Some("2001:db8::1"));
    let provider = MockDnsProvider::new();
    let config = test_config(true);
    let shutdown = CancellationToken::new();

    let (mut engine, mut events) = engine_with(
        transport.clone(),
        &provider,
        vec![record("example.com", &["home"])],
        &config,
        shutdown.clone(),
    );

    shutdown.cancel();
    let report = engine.run_cycle().await;

    assert!(report.addresses.is_none());
    assert!(report.outcomes.is_empty());
    assert_eq!(transport.v4_lookups(), 0);
    assert_eq!(transport.v6_lookups(), 0);
    assert_eq!(provider.call_count(), 0);
    assert!(drain(&mut events).is_empty());
}

#[tokio::test]
async fn repeated_cancel_is_harmless() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new();
    let config = test_config(false);
    let shutdown = CancellationToken::new();

    let (mut engine, mut events) = engine_with(
        transport,
        &provider,
        vec![record("example.com", &["home"])],
        &config,
        shutdown.clone(),
    );

    shutdown.cancel();
    shutdown.cancel();

    tokio::time::timeout(Duration::from_secs(2), engine.run())
        .await
        .expect("already cancelled engine returns at once")
        .unwrap();

    let stopped = drain(&mut events)
        .into_iter()
        .filter(|e| matches!(e, EngineEvent::Stopped { .. }))
        .count();
    assert_eq!(stopped, 1);
    assert_eq!(provider.call_count(), 0);
}
