//! Per-type identity counters.

use crate::entity::EntityId;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Issues and validates entity identities.
///
/// Each entity type has one counter holding the highest identity ever
/// issued for it. Counters only grow: deleting an entity never frees its
/// identity, and restoring a counter from a data file keeps the larger of
/// the two values.
#[derive(Debug, Default)]
pub struct IdentityManager {
    counters: RwLock<HashMap<String, u64>>,
}

impl IdentityManager {
    /// Creates a manager with no counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next identity for `type_name`.
    ///
    /// The first identity of a type is `1`. Later identities start at the
    /// counter plus one and skip every identity for which `is_occupied`
    /// returns true.
    pub fn next_id(&self, type_name: &str, is_occupied: impl Fn(EntityId) -> bool) -> EntityId {
        let mut counters = self.counters.write();
        let mut next = counters.get(type_name).map_or(1, |last| last.saturating_add(1));
        while is_occupied(EntityId::new(next)) {
            next = next.saturating_add(1);
        }
        counters.insert(type_name.to_string(), next);
        EntityId::new(next)
    }

    /// Returns true if `id` has been issued for `type_name`.
    #[must_use]
    pub fn is_known(&self, type_name: &str, id: EntityId) -> bool {
        id.is_assigned()
            && self
                .counters
                .read()
                .get(type_name)
                .is_some_and(|&last| last >= id.get())
    }

    /// Raises the counter of `type_name` to at least `last_id`.
    pub fn restore(&self, type_name: &str, last_id: u64) {
        let mut counters = self.counters.write();
        let counter = counters.entry(type_name.to_string()).or_insert(0);
        *counter = (*counter).max(last_id);
    }

    /// Records that `id` exists for `type_name`.
    ///
    /// Returns true if the counter was behind and had to be raised.
    pub fn observe(&self, type_name: &str, id: EntityId) -> bool {
        let mut counters = self.counters.write();
        match counters.get_mut(type_name) {
            Some(last) if *last >= id.get() => false,
            Some(last) => {
                *last = id.get();
                true
            }
            None => {
                counters.insert(type_name.to_string(), id.get());
                true
            }
        }
    }

    /// Returns the highest identity issued for `type_name`.
    #[must_use]
    pub fn last_id(&self, type_name: &str) -> Option<u64> {
        self.counters.read().get(type_name).copied()
    }

    /// Returns all counters, sorted by type name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut counters: Vec<_> = self
            .counters
            .read()
            .iter()
            .map(|(name, last)| (name.clone(), *last))
            .collect();
        counters.sort();
        counters
    }

    /// Forgets every counter.
    pub fn clear(&self) {
        self.counters.write().clear();
    }
}
