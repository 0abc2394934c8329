//! Bounded packet history
//!
//! Records are kept in arrival order in a `VecDeque`; the newest-first view
//! the table renders is computed from it on demand.

use std::collections::VecDeque;

use pkt_decode::SummaryRecord;

/// Default number of records kept
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Fixed-capacity, insertion-ordered record buffer
#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: VecDeque<SummaryRecord>,
    capacity: usize,
}

impl HistoryStore {
    /// Create a store holding at most `capacity` records (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a record, evicting the oldest when full
    pub fn append(&mut self, record: SummaryRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of records
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Up to `count` records starting at the `offset`-th newest, newest first
    ///
    /// The iterator borrows the store and can be cloned to restart it.
    pub fn view_newest_first(
        &self,
        offset: usize,
        count: usize,
    ) -> impl Iterator<Item = &SummaryRecord> + Clone + '_ {
        self.records.iter().rev().skip(offset).take(count)
    }

    /// The `index`-th newest record (0 = newest)
    pub fn get_newest(&self, index: usize) -> Option<&SummaryRecord> {
        let last = self.records.len().checked_sub(1)?;
        self.records.get(last.checked_sub(index)?)
    }

    /// The most recent record
    pub fn newest(&self) -> Option<&SummaryRecord> {
        self.records.back()
    }

    /// Remove all records
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
