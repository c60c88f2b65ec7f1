/// Comparison cache: every decision ever made, keyed by unordered item pair.
///
/// Append-only during sorting. Entries are only removed when an item leaves
/// the session (`delete_all_referencing`) or when undo swaps the whole cache.
use std::collections::BTreeMap;

use crate::error::SortError;
use crate::types::ItemId;

/// Canonical unordered pair of item ids. `new(a, b) == new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComparisonKey {
    low: ItemId,
    high: ItemId,
}

impl ComparisonKey {
    pub fn new(a: ItemId, b: ItemId) -> Self {
        if a <= b {
            ComparisonKey { low: a, high: b }
        } else {
            ComparisonKey { low: b, high: a }
        }
    }

    pub fn ids(&self) -> (ItemId, ItemId) {
        (self.low, self.high)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.low == id || self.high == id
    }
}

/// Mapping from `ComparisonKey` to the winning id.
///
/// Backed by a `BTreeMap` so iteration (and therefore the serialized blob) is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonCache {
    winners: BTreeMap<ComparisonKey, ItemId>,
}

impl ComparisonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: ComparisonKey) -> Option<ItemId> {
        self.winners.get(&key).copied()
    }

    /// Cached winner between `a` and `b`, in either argument order.
    pub fn winner_between(&self, a: ItemId, b: ItemId) -> Option<ItemId> {
        self.get(ComparisonKey::new(a, b))
    }

    /// Record `winner` for `key`. The winner must be one of the key's ids.
    pub fn set(&mut self, key: ComparisonKey, winner: ItemId) -> Result<(), SortError> {
        if !key.contains(winner) {
            let (left, right) = key.ids();
            return Err(SortError::WinnerNotCandidate { winner, left, right });
        }
        self.winners.insert(key, winner);
        Ok(())
    }

    /// Drop every entry whose key mentions `id`. Returns how many were removed.
    pub fn delete_all_referencing(&mut self, id: ItemId) -> usize {
        let before = self.winners.len();
        self.winners.retain(|key, _| !key.contains(id));
        before - self.winners.len()
    }

    /// Keep only entries whose both ids satisfy `keep`.
    pub(crate) fn retain_items(&mut self, mut keep: impl FnMut(ItemId) -> bool) -> usize {
        let before = self.winners.len();
        self.winners.retain(|key, _| keep(key.low) && keep(key.high));
        before - self.winners.len()
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComparisonKey, ItemId)> + '_ {
        self.winners.iter().map(|(k, w)| (*k, *w))
    }

    pub fn references(&self, id: ItemId) -> bool {
        self.winners.keys().any(|k| k.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_symmetric() {
        assert_eq!(ComparisonKey::new(3, 9), ComparisonKey::new(9, 3));
        assert_eq!(ComparisonKey::new(9, 3).ids(), (3, 9));
    }

    #[test]
    fn test_lookup_ignores_argument_order() {
        let mut cache = ComparisonCache::new();
        cache.set(ComparisonKey::new(1, 2), 2).unwrap();
        assert_eq!(cache.winner_between(1, 2), Some(2));
        assert_eq!(cache.winner_between(2, 1), Some(2));
        assert_eq!(cache.winner_between(1, 3), None);
    }

    #[test]
    fn test_set_is_idempotent() {
        let mut cache = ComparisonCache::new();
        cache.set(ComparisonKey::new(1, 2), 1).unwrap();
        cache.set(ComparisonKey::new(2, 1), 1).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.winner_between(1, 2), Some(1));
    }

    #[test]
    fn test_set_rejects_outsider() {
        let mut cache = ComparisonCache::new();
        let err = cache.set(ComparisonKey::new(1, 2), 5).unwrap_err();
        assert_eq!(err, SortError::WinnerNotCandidate { winner: 5, left: 1, right: 2 });
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete_all_referencing() {
        let mut cache = ComparisonCache::new();
        cache.set(ComparisonKey::new(1, 2), 1).unwrap();
        cache.set(ComparisonKey::new(2, 3), 3).unwrap();
        cache.set(ComparisonKey::new(1, 3), 3).unwrap();

        assert_eq!(cache.delete_all_referencing(2), 2);
        assert_eq!(cache.len(), 1);
        assert!(!cache.references(2));
        assert_eq!(cache.winner_between(3, 1), Some(3));
        assert_eq!(cache.delete_all_referencing(42), 0);
    }
}
