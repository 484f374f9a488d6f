// # Record Store
//
// In-memory, ordered collection of the domain records managed in this run.
//
// ## Purpose
//
// Tracks, per record, whether it is already synchronized with the last known
// IP address (the freshness flag). Nothing is persisted: after a restart every
// record is stale and gets pushed once.
//
// ## Ownership
//
// The store is owned by the engine and only touched by its single worker, so
// it needs no locking.

use chrono::{DateTime, Utc};
use std::fmt;

/// Provider API key
///
/// The Debug implementation intentionally does NOT expose the key.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building request headers only
    /// ⚠️ NEVER log this value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<REDACTED>)")
    }
}

/// A domain plus the subdomains updated with one API key
#[derive(Debug, Clone)]
pub struct DomainRecord {
    api_key: ApiKey,
    domain: String,
    subdomains: Vec<String>,
    fresh: bool,
    synced_at: Option<DateTime<Utc>>,
}

impl DomainRecord {
    /// Create a new, not yet synchronized record
    pub fn new(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        subdomains: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            api_key: ApiKey::new(api_key),
            domain: domain.into(),
            subdomains: subdomains.into_iter().map(Into::into).collect(),
            fresh: false,
            synced_at: None,
        }
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Whether the record matches the last known addresses
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// When the record was last fully synchronized, if it currently is
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    fn mark_fresh(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        self.fresh = true;
        self.synced_at = Some(now);
        now
    }

    fn mark_stale(&mut self) {
        self.fresh = false;
        self.synced_at = None;
    }
}

/// Ordered set of records with freshness tracking
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<DomainRecord>,
}

impl RecordStore {
    /// Create a store from the records in command line order
    pub fn new(records: Vec<DomainRecord>) -> Self {
        Self { records }
    }

    /// Get the number of records in the store
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Get a record by position
    pub fn get(&self, index: usize) -> Option<&DomainRecord> {
        self.records.get(index)
    }

    /// Iterate over all records in order
    pub fn iter(&self) -> impl Iterator<Item = &DomainRecord> {
        self.records.iter()
    }

    /// Positions of the records that still need an update, in order
    pub fn stale_indices(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.is_fresh())
            .map(|(index, _)| index)
            .collect()
    }

    /// Number of records currently synchronized
    pub fn fresh_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_fresh()).count()
    }

    /// Mark one record as synchronized, returning the sync time
    pub fn mark_fresh(&mut self, index: usize) -> Option<DateTime<Utc>> {
        self.records.get_mut(index).map(DomainRecord::mark_fresh)
    }

    /// Reset every freshness flag
    pub fn mark_all_stale(&mut self) {
        self.records.iter_mut().for_each(DomainRecord::mark_stale);
    }
}
