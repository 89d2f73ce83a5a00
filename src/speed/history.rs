use std::time::Instant;

use super::NetworkCounters;

/// Number of samples the rolling window retains.
pub(crate) const HISTORY_CAPACITY: usize = 9;

/// A counter snapshot tagged with its capture time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HistoryEntry {
    pub counters: NetworkCounters,
    pub observed_at: Instant,
}

/// Fixed-capacity ring of the most recent samples, oldest overwritten first.
///
/// Slots are held as `Option<HistoryEntry>` with an explicit write cursor, so
/// ring position arithmetic is plain index math. Exclusively owned by one
/// [`SpeedEstimator`](super::SpeedEstimator); never shared across pipelines.
#[derive(Debug)]
pub(crate) struct SampleHistory {
    slots: [Option<HistoryEntry>; HISTORY_CAPACITY],
    /// Next write position; once the ring is full this is also the oldest slot.
    cursor: usize,
}

impl SampleHistory {
    pub fn new() -> Self {
        Self {
            slots: [None; HISTORY_CAPACITY],
            cursor: 0,
        }
    }

    /// Number of populated slots, at most [`HISTORY_CAPACITY`].
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// The most recently inserted entry, if any.
    pub fn newest(&self) -> Option<&HistoryEntry> {
        self.slots[(self.cursor + HISTORY_CAPACITY - 1) % HISTORY_CAPACITY].as_ref()
    }

    /// Inserts an entry at the write cursor, evicting the oldest entry once
    /// the ring is full.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.slots[self.cursor] = Some(entry);
        self.cursor = (self.cursor + 1) % HISTORY_CAPACITY;
    }

    /// Drops all entries. Used when the underlying counter stream resets.
    pub fn clear(&mut self) {
        self.slots = [None; HISTORY_CAPACITY];
        self.cursor = 0;
    }

    /// Iterates populated entries in ring order, oldest first.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        (0..HISTORY_CAPACITY)
            .filter_map(move |offset| self.slots[(self.cursor + offset) % HISTORY_CAPACITY].as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(rx_bytes: u64) -> HistoryEntry {
        HistoryEntry {
            counters: NetworkCounters {
                rx_bytes,
                tx_bytes: 0,
            },
            observed_at: Instant::now(),
        }
    }

    #[test]
    fn test_empty_history() {
        let history = SampleHistory::new();
        assert_eq!(history.len(), 0);
        assert!(history.newest().is_none());
        assert_eq!(history.iter_oldest_first().count(), 0);
    }

    #[test]
    fn test_push_and_newest() {
        let mut history = SampleHistory::new();
        history.push(entry(1));
        history.push(entry(2));
        assert_eq!(history.len(), 2);
        assert_eq!(history.newest().unwrap().counters.rx_bytes, 2);
    }

    #[test]
    fn test_iteration_order_while_warming() {
        let mut history = SampleHistory::new();
        for rx in 1..=4 {
            history.push(entry(rx));
        }
        let order: Vec<u64> = history
            .iter_oldest_first()
            .map(|e| e.counters.rx_bytes)
            .collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_eviction_after_capacity_overflow() {
        let mut history = SampleHistory::new();
        for rx in 1..=10 {
            history.push(entry(rx));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        let order: Vec<u64> = history
            .iter_oldest_first()
            .map(|e| e.counters.rx_bytes)
            .collect();
        assert_eq!(order, vec![2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(history.newest().unwrap().counters.rx_bytes, 10);
    }

    #[test]
    fn test_clear() {
        let mut history = SampleHistory::new();
        for rx in 1..=10 {
            history.push(entry(rx));
        }
        history.clear();
        assert_eq!(history.len(), 0);
        assert!(history.newest().is_none());
        history.push(entry(42));
        assert_eq!(history.newest().unwrap().counters.rx_bytes, 42);
    }
}
