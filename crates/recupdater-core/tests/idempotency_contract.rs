//! Architectural Contract Test: Idempotency
//!
//! An unchanged public address must not cause a single provider call for
//! records that are already synchronized.
//!
//! Constraints verified:
//! - First cycle pushes every record once
//! - Second cycle with the same address skips synchronized records entirely
//! - Only records left stale by a failure are retried

mod common;

use common::*;
use recupdater_core::{CancellationToken, EngineEvent, UpdateOutcome};

#[tokio::test]
async fn unchanged_address_makes_zero_calls() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new();
    let config = test_config(true);

    let (mut engine, mut events) = engine_with(
        transport.clone(),
        &provider,
        vec![record("example.com", &["home"])],
        &config,
        CancellationToken::new(),
    );

    // Cycle 1: one update for home/A
    let first = engine.run_cycle().await;
    assert!(first.changed);
    assert_eq!(first.outcome_of(0), Some(&UpdateOutcome::Success));
    assert_eq!(
        provider.calls(),
        vec![ProviderCall::new("example.com", "home", "1.2.3.4")]
    );
    assert!(engine.store().get(0).unwrap().is_fresh());

    // Cycle 2: same address, record skipped
    let second = engine.run_cycle().await;
    assert!(!second.changed);
    assert_eq!(second.skipped, 1);
    assert!(second.outcomes.is_empty());
    assert_eq!(provider.call_count(), 1, "no provider call for a fresh record");

    // The skipped record produced no events at all
    let events = drain(&mut events);
    let started = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::UpdateStarted { .. }))
        .count();
    assert_eq!(started, 1);
}

#[tokio::test]
async fn only_failed_records_are_retried() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), None);
    let provider = MockDnsProvider::new();
    provider.reject("www.example.org", "Rate limit");
    let config = test_config(false);

    let (mut engine, _events) = engine_with(
        transport,
        &provider,
        vec![
            record("example.com", &["home"]),
            record("example.org", &["www"]),
        ],
        &config,
        CancellationToken::new(),
    );

    let first = engine.run_cycle().await;
    assert_eq!(first.outcome_of(0), Some(&UpdateOutcome::Success));
    assert_eq!(
        first.outcome_of(1),
        Some(&UpdateOutcome::Failed("Rate limit".to_string()))
    );

    provider.accept_all();
    let second = engine.run_cycle().await;

    assert_eq!(second.skipped, 1);
    assert_eq!(second.outcome_of(1), Some(&UpdateOutcome::Success));
    assert_eq!(
        provider.calls(),
        vec![
            ProviderCall::new("example.com", "home", "1.2.3.4"),
            ProviderCall::new("example.org", "www", "1.2.3.4"),
            ProviderCall::new("example.org", "www", "1.2.3.4"),
        ]
    );
    assert_eq!(engine.store().fresh_count(), 2);
}

#[tokio::test]
async fn many_unchanged_cycles_stay_silent() {
    let transport = SwitchableIpTransport::new(Some("1.2.3.4"), Some("2001:db8::1"));
    let provider = MockDnsProvider::new();
    let config = test_config(true);

    let (mut engine, _events) = engine_with(
        transport.clone(),
        &provider,
        vec![record("example.com", &["home", "www"])],
        &config,
        CancellationToken::new(),
    );

    engine.run_cycle().await;
    let after_first = provider.call_count();
    assert_eq!(after_first, 4, "two subdomains times two families");

    for _ in 0..5 {
        engine.run_cycle().await;
    }

    assert_eq!(provider.call_count(), after_first);
    assert_eq!(transport.v4_lookups(), 6, "the address is still looked up every cycle");
}
