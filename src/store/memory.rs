use crate::core::cache::{RateEntry, RateKey, RateStore};
use crate::core::currency::CurrencyCode;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    pub total_pairs: usize,
    pub oldest_update: Option<DateTime<Utc>>,
    pub newest_update: Option<DateTime<Utc>>,
}

/// In-memory rate table guarded by a single reader/writer lock.
///
/// Entries are only ever inserted or replaced whole, so readers observe either
/// the previous or the new rate for a pair.
#[derive(Debug, Default)]
pub struct MemoryRateTable {
    entries: RwLock<HashMap<RateKey, RateEntry>>,
}

impl MemoryRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_entry(&self, key: &RateKey) -> Option<RateEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).copied()
    }

    /// Snapshot of all entries sorted by pair.
    pub fn entries(&self) -> Vec<(RateKey, RateEntry)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot: Vec<_> = entries.iter().map(|(k, v)| (k.clone(), *v)).collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let updates = entries.values().map(|e| e.last_updated);
        CacheStats {
            total_pairs: entries.len(),
            oldest_update: updates.clone().min(),
            newest_update: updates.max(),
        }
    }
}

impl RateStore for MemoryRateTable {
    fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<f64> {
        let rate = self.get_entry(&RateKey::new(from, to)).map(|e| e.rate);
        if rate.is_some() {
            debug!("Cache HIT for {}-{}", from, to);
        } else {
            debug!("Cache MISS for {}-{}", from, to);
        }
        rate
    }

    fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) {
        let key = RateKey::new(from, to);
        if key.is_identity() {
            debug!("Ignoring same-currency rate for {}", key);
            return;
        }

        let entry = RateEntry {
            rate,
            last_updated: Utc::now(),
        };
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        debug!("Cache PUT for {}", key);
        entries.insert(key, entry);
    }
}
