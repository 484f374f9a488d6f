//! Update engine
//!
//! The UpdateEngine is responsible for:
//! - Resolving the public addresses via IpResolver
//! - Detecting address changes and invalidating records
//! - Updating stale records via DnsProvider
//! - Waiting out the update period, interruptible by shutdown
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ResolvedAddresses   ┌────────────────┐
//! │ IpResolver  │──────────────────────▶│ ChangeDetector │
//! └─────────────┘                       └────────────────┘
//!                                               │ reset flags
//!                                               ▼
//!                                       ┌──────────────┐
//!                                       │ RecordStore  │
//!                                       └──────────────┘
//!                                               │ stale records
//!         ┌─────────────────────────────────────┼──────────────────┐
//!         ▼                                     ▼                  ▼
//! ┌─────────────┐                       ┌──────────────┐   ┌─────────────┐
//! │ DnsProvider │                       │  Scheduler   │   │   Events    │
//! │ (update)    │                       │  (wait)      │   │  (report)   │
//! └─────────────┘                       └──────────────┘   └─────────────┘
//! ```
//!
//! ## Cycle Flow
//!
//! 1. Resolve addresses (abort the cycle if both are empty)
//! 2. On change, mark every record stale
//! 3. For each stale record, push every subdomain and address family
//! 4. Mark the record fresh only if every request succeeded
//! 5. Wait for the period or shutdown
//!
//! Shutdown is checked at cycle start, before each record and before each
//! request. A request already in flight is allowed to finish.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::UpdaterConfig;
use crate::detector::ChangeDetector;
use crate::error::{Error, Result};
use crate::resolver::{IpResolver, ResolvedAddresses};
use crate::scheduler::{Scheduler, Wake};
use crate::store::{DomainRecord, RecordStore};
use crate::traits::{DnsProvider, UpdateTarget};

/// Capacity of the event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events emitted by the UpdateEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        records_count: usize,
    },

    /// Neither address could be determined, the cycle was skipped
    IpResolutionFailed {
        service: String,
    },

    /// The resolved addresses differ from the previous cycle
    AddressChanged {
        addresses: ResolvedAddresses,
    },

    /// A stale record is being pushed
    UpdateStarted {
        domain: String,
        subdomains: Vec<String>,
    },

    /// Every subdomain and family of the record was accepted
    UpdateSucceeded {
        domain: String,
        synced_at: DateTime<Utc>,
    },

    /// Shutdown interrupted the record
    UpdateCanceled {
        domain: String,
    },

    /// The provider rejected one of the record's requests
    UpdateFailed {
        domain: String,
        reason: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Result of updating one record in one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Success,
    Canceled,
    Failed(String),
}

/// Outcome of one record, as listed in a [`CycleReport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Position of the record in the store
    pub index: usize,
    pub domain: String,
    pub outcome: UpdateOutcome,
}

/// Summary of one cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Addresses of this cycle, `None` if resolution failed or was skipped
    pub addresses: Option<ResolvedAddresses>,
    /// Whether the addresses differ from the previous cycle
    pub changed: bool,
    /// Fresh records that were skipped
    pub skipped: usize,
    /// Stale records, in processing order
    pub outcomes: Vec<RecordOutcome>,
}

impl CycleReport {
    /// Outcome for the record at `index`, if it was stale this cycle
    pub fn outcome_of(&self, index: usize) -> Option<&UpdateOutcome> {
        self.outcomes
            .iter()
            .find(|record| record.index == index)
            .map(|record| &record.outcome)
    }
}

/// Core update engine
///
/// ## Lifecycle
///
/// 1. Create with [`UpdateEngine::new()`]
/// 2. Start with [`UpdateEngine::run()`]
/// 3. Engine cycles until the shutdown token is cancelled
///
/// ## Threading
///
/// A single worker drives cycles sequentially. No two records are ever
/// updated at the same time. The engine owns its record store exclusively,
/// which is why the cycle methods take `&mut self`.
pub struct UpdateEngine {
    /// Public address lookup
    resolver: IpResolver,

    /// DNS provider for updating records
    provider: Box<dyn DnsProvider>,

    /// Records and their freshness flags
    store: RecordStore,

    /// Addresses of the last change
    detector: ChangeDetector,

    /// Period wait
    scheduler: Scheduler,

    /// Process-wide shutdown request
    shutdown: CancellationToken,

    /// Event sender for the reporter
    event_tx: mpsc::Sender<EngineEvent>,
}

impl UpdateEngine {
    /// Create a new update engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: public address lookup
    /// - `provider`: DNS provider implementation
    /// - `records`: records to manage, in processing order
    /// - `config`: runtime configuration
    /// - `shutdown`: token cancelled by the signal handler
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        resolver: IpResolver,
        provider: Box<dyn DnsProvider>,
        records: Vec<DomainRecord>,
        config: &UpdaterConfig,
        shutdown: CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        if records.is_empty() {
            return Err(Error::config("No records configured"));
        }
        if let Some(record) = records.iter().find(|record| record.subdomains().is_empty()) {
            return Err(Error::invalid_input(format!(
                "Record '{}' has no subdomains",
                record.domain()
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            resolver,
            provider,
            store: RecordStore::new(records),
            detector: ChangeDetector::new(),
            scheduler: Scheduler::new(config.update_period(), shutdown.clone()),
            shutdown,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Records and their current freshness
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Addresses remembered from the last change
    pub fn last_addresses(&self) -> &ResolvedAddresses {
        self.detector.last()
    }

    /// Handle for requesting shutdown from another task
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Run the engine
    ///
    /// Cycles until the shutdown token is cancelled. Per-cycle and per-record
    /// errors are reported as events and never end the loop.
    pub async fn run(&mut self) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            records_count: self.store.len(),
        });
        info!(
            "Engine started: {} record(s), period {:?}, provider {}",
            self.store.len(),
            self.scheduler.period(),
            self.provider.provider_name()
        );

        while self.scheduler.should_continue() {
            let report = self.run_cycle().await;
            debug!(
                "Cycle done: {} updated, {} skipped",
                report.outcomes.len(),
                report.skipped
            );

            if self.scheduler.wait().await == Wake::Shutdown {
                break;
            }
        }

        info!("Shutdown signal received, engine stopped");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run a single cycle: resolve, detect, update stale records
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        if self.shutdown.is_cancelled() {
            return report;
        }

        let addresses = match self.resolver.resolve().await {
            Ok(addresses) => addresses,
            Err(e) => {
                warn!("{}", e);
                self.emit_event(EngineEvent::IpResolutionFailed {
                    service: self.resolver.service_url().to_string(),
                });
                return report;
            }
        };
        report.addresses = Some(addresses);

        if self.shutdown.is_cancelled() {
            return report;
        }

        report.changed = self.detector.observe(&addresses, &mut self.store);
        if report.changed {
            self.emit_event(EngineEvent::AddressChanged { addresses });
        }

        let stale = self.store.stale_indices();
        report.skipped = self.store.len() - stale.len();

        for (position, &index) in stale.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                // Records never started are canceled without any event
                for &pending in &stale[position..] {
                    report.outcomes.push(self.outcome(pending, UpdateOutcome::Canceled));
                }
                break;
            }

            let outcome = self.process_record(index, &addresses).await;
            report.outcomes.push(self.outcome(index, outcome));
        }

        report
    }

    /// Update one stale record and report the result
    async fn process_record(&mut self, index: usize, addresses: &ResolvedAddresses) -> UpdateOutcome {
        let Some(record) = self.store.get(index) else {
            return UpdateOutcome::Failed(format!("No record at position {index}"));
        };
        let domain = record.domain().to_string();

        self.emit_event(EngineEvent::UpdateStarted {
            domain: domain.clone(),
            subdomains: record.subdomains().to_vec(),
        });

        let outcome = self.update_record(record, addresses).await;

        match &outcome {
            UpdateOutcome::Success => {
                let synced_at = self.store.mark_fresh(index).unwrap_or_else(Utc::now);
                self.emit_event(EngineEvent::UpdateSucceeded { domain, synced_at });
            }
            UpdateOutcome::Canceled => {
                self.emit_event(EngineEvent::UpdateCanceled { domain });
            }
            UpdateOutcome::Failed(reason) => {
                self.emit_event(EngineEvent::UpdateFailed {
                    domain,
                    reason: reason.clone(),
                });
            }
        }

        outcome
    }

    /// Push every subdomain and family of `record`
    ///
    /// Stops at the first rejection. Success means every request was accepted.
    async fn update_record(&self, record: &DomainRecord, addresses: &ResolvedAddresses) -> UpdateOutcome {
        let families = self.families(addresses);
        if families.is_empty() {
            return UpdateOutcome::Failed("No address to publish".to_string());
        }

        for subdomain in record.subdomains() {
            for &address in &families {
                if self.shutdown.is_cancelled() {
                    debug!("Shutdown before {}.{} ({})", subdomain, record.domain(), address);
                    return UpdateOutcome::Canceled;
                }

                let target = UpdateTarget::new(record.api_key(), record.domain(), subdomain);
                match self.provider.update_address(&target, address).await {
                    Ok(()) => {
                        debug!("Updated {}.{} -> {}", subdomain, record.domain(), address);
                    }
                    Err(_) if self.shutdown.is_cancelled() => {
                        return UpdateOutcome::Canceled;
                    }
                    Err(Error::ProviderRejected { message }) => {
                        return UpdateOutcome::Failed(message);
                    }
                    Err(e) => {
                        return UpdateOutcome::Failed(e.to_string());
                    }
                }
            }
        }

        UpdateOutcome::Success
    }

    /// Addresses to push for every subdomain, IPv4 first
    fn families(&self, addresses: &ResolvedAddresses) -> Vec<IpAddr> {
        let ipv4 = addresses.ipv4.map(IpAddr::V4);
        let ipv6 = addresses
            .ipv6
            .filter(|_| self.resolver.ipv6_enabled())
            .map(IpAddr::V6);

        ipv4.into_iter().chain(ipv6).collect()
    }

    fn outcome(&self, index: usize, outcome: UpdateOutcome) -> RecordOutcome {
        RecordOutcome {
            index,
            domain: self
                .store
                .get(index)
                .map(|record| record.domain().to_string())
                .unwrap_or_default(),
            outcome,
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        if self.event_tx.try_send(event).is_err() {
            // Full or closed: the reporter is slower than the engine or gone
            warn!("Event channel full, dropping event");
        }
    }
}
