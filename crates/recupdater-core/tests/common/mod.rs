//! Test doubles and common utilities for engine contract tests
//!
//! These doubles stand in for the network: a lookup transport whose answers
//! can be switched between cycles, and a provider that records every call
//! and can be scripted to reject or to request shutdown.

#![allow(dead_code)]

use recupdater_core::error::{Error, Result};
use recupdater_core::traits::{DnsProvider, HttpRequest, IpVersion, Transport, UpdateTarget};
use recupdater_core::{
    CancellationToken, DomainRecord, EngineEvent, IpResolver, UpdateEngine, UpdaterConfig,
};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Lookup transport answering per IP version
pub struct SwitchableIpTransport {
    answers: Mutex<(Option<String>, Option<String>)>,
    v4_lookups: AtomicUsize,
    v6_lookups: AtomicUsize,
}

impl SwitchableIpTransport {
    /// `None` makes the lookup fail at transport level
    pub fn new(v4: Option<&str>, v6: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new((v4.map(str::to_string), v6.map(str::to_string))),
            v4_lookups: AtomicUsize::new(0),
            v6_lookups: AtomicUsize::new(0),
        })
    }

    /// Change what the next lookups return
    pub fn set(&self, v4: Option<&str>, v6: Option<&str>) {
        *self.answers.lock().unwrap() = (v4.map(str::to_string), v6.map(str::to_string));
    }

    pub fn v4_lookups(&self) -> usize {
        self.v4_lookups.load(Ordering::SeqCst)
    }

    pub fn v6_lookups(&self) -> usize {
        self.v6_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for SwitchableIpTransport {
    async fn perform(&self, request: HttpRequest) -> Result<String> {
        let answers = self.answers.lock().unwrap().clone();
        let answer = match request.ip_version {
            Some(IpVersion::V6) => {
                self.v6_lookups.fetch_add(1, Ordering::SeqCst);
                answers.1
            }
            _ => {
                self.v4_lookups.fetch_add(1, Ordering::SeqCst);
                answers.0
            }
        };
        answer
            .map(|ip| format!("{ip}\n"))
            .ok_or_else(|| Error::transport("connection refused"))
    }
}

/// One call received by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderCall {
    pub domain: String,
    pub subdomain: String,
    pub address: IpAddr,
}

impl ProviderCall {
    pub fn new(domain: &str, subdomain: &str, address: &str) -> Self {
        Self {
            domain: domain.to_string(),
            subdomain: subdomain.to_string(),
            address: address.parse().unwrap(),
        }
    }
}

#[derive(Default)]
struct ProviderState {
    calls: Mutex<Vec<ProviderCall>>,
    /// "subdomain.domain" -> rejection message
    rejections: Mutex<HashMap<String, String>>,
    /// "subdomain.domain" whose IPv6 update is rejected
    v6_rejections: Mutex<HashMap<String, String>>,
    /// Cancel this token when the call with this 1-based number completes
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
}

/// A mock DnsProvider that records calls
pub struct MockDnsProvider {
    state: Arc<ProviderState>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ProviderState::default()),
        }
    }

    /// Create a new MockDnsProvider that shares state with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            state: Arc::clone(&other.state),
        }
    }

    /// Reject every update of `subdomain.domain` with `message`
    pub fn reject(&self, fqdn: &str, message: &str) {
        self.state
            .rejections
            .lock()
            .unwrap()
            .insert(fqdn.to_string(), message.to_string());
    }

    /// Reject only the IPv6 update of `subdomain.domain`
    pub fn reject_v6(&self, fqdn: &str, message: &str) {
        self.state
            .v6_rejections
            .lock()
            .unwrap()
            .insert(fqdn.to_string(), message.to_string());
    }

    /// Accept everything again
    pub fn accept_all(&self) {
        self.state.rejections.lock().unwrap().clear();
        self.state.v6_rejections.lock().unwrap().clear();
    }

    /// Request shutdown while call number `call` is in flight
    pub fn cancel_during_call(&self, call: usize, token: CancellationToken) {
        *self.state.cancel_after.lock().unwrap() = Some((call, token));
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn update_address(&self, target: &UpdateTarget<'_>, address: IpAddr) -> Result<()> {
        let fqdn = format!("{}.{}", target.subdomain, target.domain);
        let number = {
            let mut calls = self.state.calls.lock().unwrap();
            calls.push(ProviderCall {
                domain: target.domain.to_string(),
                subdomain: target.subdomain.to_string(),
                address,
            });
            calls.len()
        };

        if let Some((call, token)) = self.state.cancel_after.lock().unwrap().as_ref()
            && *call == number
        {
            token.cancel();
        }

        if let Some(message) = self.state.rejections.lock().unwrap().get(&fqdn) {
            return Err(Error::rejected(message.clone()));
        }
        if address.is_ipv6()
            && let Some(message) = self.state.v6_rejections.lock().unwrap().get(&fqdn)
        {
            return Err(Error::rejected(message.clone()));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Configuration used by the contract tests
pub fn test_config(enable_ipv6: bool) -> UpdaterConfig {
    UpdaterConfig {
        ttl_secs: 18000,
        update_period_secs: 120,
        request_timeout_secs: 5,
        enable_ipv6,
        ..UpdaterConfig::default()
    }
}

/// Build an engine wired to the given doubles
pub fn engine_with(
    transport: Arc<SwitchableIpTransport>,
    provider: &MockDnsProvider,
    records: Vec<DomainRecord>,
    config: &UpdaterConfig,
    shutdown: CancellationToken,
) -> (UpdateEngine, mpsc::Receiver<EngineEvent>) {
    let resolver = IpResolver::from_config(transport, config);
    UpdateEngine::new(
        resolver,
        Box::new(MockDnsProvider::sharing_state_with(provider)),
        records,
        config,
        shutdown,
    )
    .expect("engine construction succeeds")
}

/// Collect every event emitted so far
pub fn drain(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn record(domain: &str, subdomains: &[&str]) -> DomainRecord {
    DomainRecord::new("test-api-key", domain, subdomains.iter().copied())
}
