//! IP change detection
//!
//! Remembers the addresses of the previous cycle. A change in either family
//! invalidates every record before the cycle touches any of them.

use tracing::debug;

use crate::resolver::ResolvedAddresses;
use crate::store::RecordStore;

/// Compares each cycle's addresses against the previous cycle's
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    last: ResolvedAddresses,
}

impl ChangeDetector {
    /// Create a detector with no remembered addresses
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses of the last observed change
    pub fn last(&self) -> &ResolvedAddresses {
        &self.last
    }

    /// Feed the newly resolved addresses
    ///
    /// On change every freshness flag in `store` is reset and the new
    /// addresses are remembered. Returns whether anything changed.
    pub fn observe(&mut self, current: &ResolvedAddresses, store: &mut RecordStore) -> bool {
        if *current == self.last {
            return false;
        }

        debug!("Public address changed: {} -> {}", self.last, current);
        store.mark_all_stale();
        self.last = *current;
        true
    }
}
