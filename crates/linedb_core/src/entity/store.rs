//! In-memory entity store.

use crate::entity::EntityId;
use crate::record::EntityRecord;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A row of the entity store.
///
/// Rows are either typed entities or raw records of a type that has not been
/// used with the database yet. Both can render themselves as record fields,
/// so a flush writes every row regardless of its state.
pub trait StoredEntity: Send + Sync + 'static {
    /// The row's identity.
    fn id(&self) -> EntityId;

    /// Encoded property fields, excluding `Id`.
    fn fields(&self) -> Vec<(String, String)>;

    /// Returns the row as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// A loaded record kept verbatim until its Rust type is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord(pub EntityRecord);

impl StoredEntity for RawRecord {
    fn id(&self) -> EntityId {
        self.0.id
    }

    fn fields(&self) -> Vec<(String, String)> {
        self.0.fields.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

type Table = Arc<RwLock<HashMap<EntityId, Box<dyn StoredEntity>>>>;

/// Type name to identity to entity.
///
/// The store is safe to use from many threads without outside locking.
/// Each operation locks only the table of the type it touches, so a put or
/// remove is atomic with respect to that table alone.
#[derive(Default)]
pub struct EntityStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl EntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, type_name: &str) -> Option<Table> {
        self.tables.read().get(type_name).cloned()
    }

    fn table_or_create(&self, type_name: &str) -> Table {
        if let Some(table) = self.table(type_name) {
            return table;
        }
        self.tables
            .write()
            .entry(type_name.to_string())
            .or_default()
            .clone()
    }

    /// Inserts or replaces a row. Returns true if a row was replaced.
    pub fn put(&self, type_name: &str, id: EntityId, entity: Box<dyn StoredEntity>) -> bool {
        self.table_or_create(type_name)
            .write()
            .insert(id, entity)
            .is_some()
    }

    /// Applies `f` to the row, if present.
    pub fn get<R>(
        &self,
        type_name: &str,
        id: EntityId,
        f: impl FnOnce(&dyn StoredEntity) -> R,
    ) -> Option<R> {
        let table = self.table(type_name)?;
        let rows = table.read();
        rows.get(&id).map(|row| f(row.as_ref()))
    }

    /// Applies `f` to every row of a type and collects the results, ordered
    /// by identity. Rows for which `f` returns `None` are skipped.
    pub fn get_all<R>(
        &self,
        type_name: &str,
        mut f: impl FnMut(&dyn StoredEntity) -> Option<R>,
    ) -> Vec<R> {
        let Some(table) = self.table(type_name) else {
            return Vec::new();
        };
        let rows = table.read();
        let mut ids: Vec<EntityId> = rows.keys().copied().collect();
        ids.sort_unstable();
        ids.iter()
            .filter_map(|id| rows.get(id).and_then(|row| f(row.as_ref())))
            .collect()
    }

    /// Removes a row. Returns false if the type or the row is unknown.
    pub fn remove(&self, type_name: &str, id: EntityId) -> bool {
        self.table(type_name)
            .is_some_and(|table| table.write().remove(&id).is_some())
    }

    /// Returns true if the row exists.
    #[must_use]
    pub fn contains(&self, type_name: &str, id: EntityId) -> bool {
        self.table(type_name)
            .is_some_and(|table| table.read().contains_key(&id))
    }

    /// Number of rows of one type.
    #[must_use]
    pub fn len(&self, type_name: &str) -> usize {
        self.table(type_name).map_or(0, |table| table.read().len())
    }

    /// Number of rows across all types.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.tables
            .read()
            .values()
            .map(|table| table.read().len())
            .sum()
    }

    /// Returns true if no type has any row.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_len() == 0
    }

    /// Names of every type with a table, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Replaces rows of one type in place.
    ///
    /// `f` is called for every row; a returned row replaces the old one.
    /// Returns the number of replaced rows.
    pub fn replace_with(
        &self,
        type_name: &str,
        mut f: impl FnMut(&dyn StoredEntity) -> Option<Box<dyn StoredEntity>>,
    ) -> usize {
        let Some(table) = self.table(type_name) else {
            return 0;
        };
        let mut rows = table.write();
        let mut replaced = 0;
        for row in rows.values_mut() {
            if let Some(new_row) = f(row.as_ref()) {
                *row = new_row;
                replaced += 1;
            }
        }
        replaced
    }

    /// Drops every row of every type.
    pub fn clear(&self) {
        self.tables.write().clear();
    }
}

impl std::fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityStore")
            .field("types", &self.type_names())
            .field("rows", &self.total_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(type_name: &str, id: u64, fields: &[(&str, &str)]) -> Box<dyn StoredEntity> {
        Box::new(RawRecord(EntityRecord {
            type_name: type_name.to_string(),
            id: EntityId::new(id),
            fields: fields
                .iter()
                .map(|(n, t)| ((*n).to_string(), (*t).to_string()))
                .collect(),
        }))
    }

    #[test]
    fn put_get_remove() {
        let store = EntityStore::new();
        assert!(!store.put("Apple", EntityId::new(1), raw("Apple", 1, &[("color", "RED")])));

        let fields = store.get("Apple", EntityId::new(1), |row| row.fields()).unwrap();
        assert_eq!(fields, vec![("color".to_string(), "RED".to_string())]);

        assert!(store.remove("Apple", EntityId::new(1)));
        assert!(!store.remove("Apple", EntityId::new(1)));
        assert!(!store.remove("Pear", EntityId::new(1)));
        assert!(store.get("Apple", EntityId::new(1), |_| ()).is_none());
    }

    #[test]
    fn put_replaces() {
        let store = EntityStore::new();
        store.put("Apple", EntityId::new(1), raw("Apple", 1, &[]));
        assert!(store.put("Apple", EntityId::new(1), raw("Apple", 1, &[("w", "1")])));
        assert_eq!(store.len("Apple"), 1);
    }

    #[test]
    fn get_all_is_ordered_by_id() {
        let store = EntityStore::new();
        for id in [3, 1, 2] {
            store.put("Apple", EntityId::new(id), raw("Apple", id, &[]));
        }
        let ids = store.get_all("Apple", |row| Some(row.id().get()));
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(store.get_all("Pear", |row| Some(row.id())).is_empty());
    }

    #[test]
    fn counts_and_names() {
        let store = EntityStore::new();
        assert!(store.is_empty());
        store.put("Pear", EntityId::new(1), raw("Pear", 1, &[]));
        store.put("Apple", EntityId::new(1), raw("Apple", 1, &[]));
        store.put("Apple", EntityId::new(2), raw("Apple", 2, &[]));

        assert_eq!(store.len("Apple"), 2);
        assert_eq!(store.total_len(), 3);
        assert!(store.contains("Pear", EntityId::new(1)));
        assert_eq!(store.type_names(), vec!["Apple", "Pear"]);

        store.clear();
        assert!(store.is_empty());
        assert!(store.type_names().is_empty());
    }

    #[test]
    fn replace_with_swaps_matching_rows() {
        let store = EntityStore::new();
        store.put("Apple", EntityId::new(1), raw("Apple", 1, &[]));
        store.put("Apple", EntityId::new(2), raw("Apple", 2, &[]));

        let replaced = store.replace_with("Apple", |row| {
            (row.id() == EntityId::new(2)).then(|| raw("Apple", 2, &[("color", "GREEN")]))
        });
        assert_eq!(replaced, 1);
        let fields = store.get("Apple", EntityId::new(2), |row| row.fields()).unwrap();
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn concurrent_puts_on_one_table() {
        let store = Arc::new(EntityStore::new());
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50u64 {
                        let id = t * 50 + i + 1;
                        store.put("Apple", EntityId::new(id), raw("Apple", id, &[]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len("Apple"), 200);
    }
}
