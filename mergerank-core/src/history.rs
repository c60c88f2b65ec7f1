/// Undo history: snapshots of the state taken right before each change.
use crate::cache::ComparisonCache;
use crate::constants::HISTORY_DEPTH;

/// Deep copy of the mutable session counters and cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub cache: ComparisonCache,
    pub comparison_count: usize,
    pub settled_count: usize,
    pub total_battles: usize,
}

/// Bounded snapshot stack. Oldest entries fall off once `capacity` is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    snapshots: Vec<HistorySnapshot>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        History::with_capacity(HISTORY_DEPTH)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        History {
            snapshots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, snapshot: HistorySnapshot) {
        if self.capacity == 0 {
            return;
        }
        self.snapshots.push(snapshot);
        if self.snapshots.len() > self.capacity {
            let excess = self.snapshots.len() - self.capacity;
            self.snapshots.drain(..excess);
        }
    }

    pub fn pop(&mut self) -> Option<HistorySnapshot> {
        self.snapshots.pop()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Oldest first.
    pub fn snapshots(&self) -> &[HistorySnapshot] {
        &self.snapshots
    }
}
