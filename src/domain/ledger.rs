//! In-memory view of the processed-items history.

use std::collections::{HashSet, VecDeque};

use crate::domain::identity::IdentityKey;

/// Ordered set of identity keys that have already been processed.
///
/// Insertion order is kept for FIFO trimming; membership checks go through a
/// hash index.
#[derive(Debug, Clone, Default)]
pub struct HistoryLedger {
    order: VecDeque<IdentityKey>,
    index: HashSet<IdentityKey>,
}

impl HistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a ledger from keys in insertion order, dropping repeats.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = IdentityKey>,
    {
        let mut ledger = Self::new();
        for key in keys {
            ledger.append(key);
        }
        ledger
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.index.contains(key)
    }

    /// Appends `key` unless it is already present.
    ///
    /// Returns `true` when the key was new. A repeated key keeps its original
    /// position.
    pub fn append(&mut self, key: IdentityKey) -> bool {
        if !self.index.insert(key.clone()) {
            return false;
        }
        self.order.push_back(key);
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &IdentityKey> {
        self.order.iter()
    }

    /// The newest `capacity` keys, oldest first.
    pub fn most_recent(&self, capacity: usize) -> impl Iterator<Item = &IdentityKey> {
        self.order.iter().skip(self.order.len().saturating_sub(capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryLedger;
    use crate::domain::identity::IdentityKey;

    fn key(n: usize) -> IdentityKey {
        IdentityKey::digest(&format!("item-{n}"))
    }

    #[test]
    fn append_is_idempotent() {
        let mut ledger = HistoryLedger::new();

        assert!(ledger.append(key(1)));
        assert!(ledger.append(key(2)));
        assert!(!ledger.append(key(1)));

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.iter().cloned().collect::<Vec<_>>(), vec![key(1), key(2)]);
    }

    #[test]
    fn reappending_an_old_key_does_not_refresh_it() {
        let mut ledger = HistoryLedger::from_keys((0..3).map(key));

        ledger.append(key(0));
        ledger.append(key(3));

        let kept: Vec<_> = ledger.most_recent(3).cloned().collect();
        assert_eq!(kept, vec![key(1), key(2), key(3)]);
    }

    #[test]
    fn most_recent_takes_the_tail_in_order() {
        let ledger = HistoryLedger::from_keys((0..5).map(key));

        let tail: Vec<_> = ledger.most_recent(2).cloned().collect();

        assert_eq!(tail, vec![key(3), key(4)]);
        assert_eq!(ledger.most_recent(10).count(), 5);
    }
}
