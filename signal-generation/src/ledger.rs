// History Ledger
// Capacity-bounded, newest-first log of generated signals

use super::config::ConfigError;
use common::Signal;
use std::collections::VecDeque;

/// Append-only history of past signals.
///
/// Entries are snapshots taken at append time; later changes to the live
/// signal (expiry) are not reflected here.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    capacity: usize,
    entries: VecDeque<Signal>,
}

impl HistoryLedger {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        })
    }

    /// Insert at the front, evicting the oldest entry past capacity
    pub fn append(&mut self, signal: Signal) {
        self.entries.push_front(signal);
        self.entries.truncate(self.capacity);
    }

    /// Entries, newest first
    pub fn snapshot(&self) -> Vec<Signal> {
        self.entries.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&Signal> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
