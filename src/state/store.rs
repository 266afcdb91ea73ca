//! In-memory request store keyed by request identity

use crate::error::{RouterError, RouterResult};

use alloy_primitives::{Address, B256, U256};
use std::collections::HashMap;
use tracing::debug;

/// Liveness marker of a pending request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEntry {
    /// Block height at which the request was inserted
    pub submitted_at: u64,
    /// Gas price of the submitting call, the baseline for fee settlement
    pub gas_price: U256,
    /// Token held in custody for the request, fixed at submission
    pub deposit_token: Address,
    pub deposit_amount: U256,
}

impl PendingEntry {
    /// Blocks elapsed since submission
    pub fn elapsed(&self, current_height: u64) -> u64 {
        current_height.saturating_sub(self.submitted_at)
    }
}

/// Content-addressed map from request identity to its pending entry
#[derive(Debug, Default)]
pub struct RequestStore {
    entries: HashMap<B256, PendingEntry>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new pending request
    pub fn insert(&mut self, id: B256, entry: PendingEntry) -> RouterResult<()> {
        if self.entries.contains_key(&id) {
            return Err(RouterError::ConflictRequest(id));
        }
        self.entries.insert(id, entry);
        debug!("Stored request {} at height {}", hex::encode(id), entry.submitted_at);
        Ok(())
    }

    /// Remove a request; returns the entry if it was live
    pub fn remove(&mut self, id: &B256) -> Option<PendingEntry> {
        self.entries.remove(id)
    }

    /// Submission height, `None` when the request is not pending
    pub fn height_of(&self, id: &B256) -> Option<u64> {
        self.entries.get(id).map(|e| e.submitted_at)
    }

    pub fn entry(&self, id: &B256) -> Option<&PendingEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &B256) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(height: u64) -> PendingEntry {
        PendingEntry {
            submitted_at: height,
            gas_price: U256::from(1_000_000_000u64),
            deposit_token: Address::repeat_byte(0x40),
            deposit_amount: U256::from(1_000),
        }
    }

    #[test]
    fn test_insert_conflict() {
        let mut store = RequestStore::new();
        let id = B256::repeat_byte(7);

        store.insert(id, entry(10)).unwrap();
        assert_eq!(
            store.insert(id, entry(11)),
            Err(RouterError::ConflictRequest(id))
        );
        // First insertion wins
        assert_eq!(store.height_of(&id), Some(10));
    }

    #[test]
    fn test_remove_then_reinsert() {
        let mut store = RequestStore::new();
        let id = B256::repeat_byte(1);

        store.insert(id, entry(5)).unwrap();
        assert_eq!(store.remove(&id), Some(entry(5)));
        assert_eq!(store.height_of(&id), None);
        assert_eq!(store.remove(&id), None);

        store.insert(id, entry(9)).unwrap();
        assert_eq!(store.height_of(&id), Some(9));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_elapsed_saturates() {
        assert_eq!(entry(100).elapsed(90), 0);
        assert_eq!(entry(100).elapsed(130), 30);
    }
}
