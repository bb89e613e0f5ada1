//! The persistence engine.

use crate::config::Config;
use crate::encoding::TextEncoding;
use crate::entity::{
    hydrate_raw, Entity, EntityId, EntityStore, RawRecord, Registry, Schema, StoredEntity,
    TypedRow,
};
use crate::error::{CoreError, CoreResult};
use crate::identity::IdentityManager;
use crate::record::{self, render_entity, render_header, Record};
use crate::report::{ErrorReporter, TracingReporter};
use crate::stats::DatabaseStats;
use linedb_storage::{FileBackend, InMemoryBackend, StorageBackend};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Where the in-memory state stands relative to the data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseState {
    /// Nothing loaded or saved since opening or clearing.
    Empty,
    /// In memory and on disk agree.
    Loaded,
    /// Changes are waiting for a flush.
    Dirty,
}

#[derive(Debug)]
struct Status {
    state: DatabaseState,
    /// Saves and deletes since the last flush or load.
    pending: u64,
    /// Every save and delete ever made, counted even with autosave off.
    changes: u64,
}

/// An entity database backed by one text file.
///
/// Entities live in memory, keyed by type name and identity. The whole
/// database is written to the data file on flush and read back by
/// [`load_data`](Self::load_data). With the default configuration every
/// save and delete flushes immediately.
///
/// All operations take `&self`; a `Database` can be shared between threads
/// through an `Arc`.
///
/// # Example
///
/// ```
/// use linedb_core::{Database, Entity, EntityId, SchemaBuilder};
///
/// #[derive(Debug, Clone, Default)]
/// struct Apple {
///     id: EntityId,
///     color: String,
/// }
///
/// impl Entity for Apple {
///     const TYPE_NAME: &'static str = "Apple";
///     fn id(&self) -> EntityId { self.id }
///     fn set_id(&mut self, id: EntityId) { self.id = id; }
///     fn describe(schema: &mut SchemaBuilder<Self>) {
///         schema.value("color", |a| &a.color, |a| &mut a.color);
///     }
/// }
///
/// let db = Database::open_in_memory();
/// let mut apple = Apple { color: "GREEN".into(), ..Apple::default() };
/// let id = db.save_or_update(&mut apple).unwrap();
/// assert_eq!(id, EntityId::new(1));
///
/// let found: Apple = db.get(id).unwrap().unwrap();
/// assert_eq!(found.color, "GREEN");
/// ```
pub struct Database {
    config: RwLock<Config>,
    backend: Mutex<Box<dyn StorageBackend>>,
    registry: RwLock<Registry>,
    identity: IdentityManager,
    store: EntityStore,
    status: Mutex<Status>,
    reporter: RwLock<Arc<dyn ErrorReporter>>,
    stats: DatabaseStats,
}

impl Database {
    /// Opens the database file named by `config` and loads it.
    ///
    /// A missing file is an empty database.
    pub fn open(config: Config) -> CoreResult<Self> {
        let backend = if config.create_dirs {
            FileBackend::with_create_dirs(&config.path)
        } else {
            FileBackend::new(&config.path)
        };
        let db = Self::with_backend(config, backend);
        db.load_data()?;
        Ok(db)
    }

    /// Creates a database over any storage backend. Nothing is loaded.
    pub fn with_backend(config: Config, backend: impl StorageBackend + 'static) -> Self {
        Self {
            config: RwLock::new(config),
            backend: Mutex::new(Box::new(backend)),
            registry: RwLock::new(Registry::default()),
            identity: IdentityManager::new(),
            store: EntityStore::new(),
            status: Mutex::new(Status {
                state: DatabaseState::Empty,
                pending: 0,
                changes: 0,
            }),
            reporter: RwLock::new(Arc::new(TracingReporter)),
            stats: DatabaseStats::new(),
        }
    }

    /// Creates an empty database that keeps its "file" in memory.
    #[must_use]
    pub fn open_in_memory() -> Self {
        Self::with_backend(Config::default(), InMemoryBackend::new())
    }

    // === Entities ===

    /// Saves an entity, assigning an identity if it has none.
    ///
    /// An entity whose identity is unassigned, or was never issued for its
    /// type, gets a fresh identity, which is written back into `entity`.
    /// Nested entities that are not persistent yet are saved first; a child
    /// that cannot be saved is reported and left out of the record. The
    /// store keeps a copy of `entity`.
    ///
    /// Fails only if `T` is not persistable.
    pub fn save_or_update<T: Entity>(&self, entity: &mut T) -> CoreResult<EntityId> {
        let schema = self.schema::<T>().map_err(|e| self.reported(e))?;
        let id = self.assign_id(entity);
        schema.cascade(entity, self);
        self.store.put(
            T::TYPE_NAME,
            id,
            Box::new(TypedRow::new(entity.clone(), schema)),
        );
        self.stats.record_save();
        trace!(type_name = T::TYPE_NAME, %id, "saved entity");
        self.after_change();
        Ok(id)
    }

    fn assign_id<T: Entity>(&self, entity: &mut T) -> EntityId {
        let current = entity.id();
        if self.identity.is_known(T::TYPE_NAME, current) {
            return current;
        }
        let id = self
            .identity
            .next_id(T::TYPE_NAME, |candidate| {
                self.store.contains(T::TYPE_NAME, candidate)
            });
        entity.set_id(id);
        id
    }

    /// Saves a nested entity unless its identity is already known.
    pub(crate) fn cascade_child<E: Entity>(&self, child: &mut E) {
        if self.identity.is_known(E::TYPE_NAME, child.id()) {
            return;
        }
        if self.save_or_update(child).is_ok() {
            self.stats.record_cascaded_save();
        }
    }

    /// Returns the stored, fully populated version of a (possibly shallow)
    /// entity.
    pub fn load_object<T: Entity>(&self, shallow: &T) -> CoreResult<Option<T>> {
        self.get(shallow.id())
    }

    /// Returns a copy of the entity with the given identity.
    pub fn get<T: Entity>(&self, id: EntityId) -> CoreResult<Option<T>> {
        self.schema::<T>().map_err(|e| self.reported(e))?;
        self.stats.record_read();
        Ok(self.store.get(T::TYPE_NAME, id, typed_clone::<T>).flatten())
    }

    /// Returns copies of every entity of type `T`, ordered by identity.
    pub fn get_all<T: Entity>(&self) -> CoreResult<Vec<T>> {
        self.schema::<T>().map_err(|e| self.reported(e))?;
        self.stats.record_read();
        Ok(self.store.get_all(T::TYPE_NAME, typed_clone::<T>))
    }

    /// Removes an entity from the store.
    ///
    /// Returns `Ok(false)` if no entity of this type and identity is
    /// resident. The identity is never issued again.
    pub fn delete<T: Entity>(&self, entity: &T) -> CoreResult<bool> {
        self.schema::<T>().map_err(|e| self.reported(e))?;
        let id = entity.id();
        if !id.is_assigned() || !self.store.remove(T::TYPE_NAME, id) {
            return Ok(false);
        }
        self.stats.record_delete();
        trace!(type_name = T::TYPE_NAME, %id, "deleted entity");
        self.after_change();
        Ok(true)
    }

    /// Number of resident entities of type `T`.
    #[must_use]
    pub fn count<T: Entity>(&self) -> usize {
        self.store.len(T::TYPE_NAME)
    }

    /// Highest identity issued for type `T`.
    #[must_use]
    pub fn last_id<T: Entity>(&self) -> Option<EntityId> {
        self.identity.last_id(T::TYPE_NAME).map(EntityId::new)
    }

    /// Names of every type with resident entities or a counter, sorted.
    #[must_use]
    pub fn type_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self
            .identity
            .snapshot()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        names.extend(self.store.type_names());
        names.into_iter().collect()
    }

    // === File ===

    /// Reads the data file into memory.
    ///
    /// Does nothing if the file does not exist. Otherwise counters are
    /// raised to the values in the file and every record is added to the
    /// store, replacing a resident entity with the same identity. Nested
    /// entities come back shallow. Malformed lines and undecodable
    /// properties are reported and skipped.
    pub fn load_data(&self) -> CoreResult<()> {
        let encoding = self.config.read().encoding;
        let read = self.backend.lock().read_all();
        let bytes = match read {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("no data file, nothing to load");
                return Ok(());
            }
            Err(e) => return Err(self.reported(e.into())),
        };
        let text = encoding.decode(&bytes).map_err(|e| self.reported(e))?;

        let reporter = |error: &CoreError| self.report(error);
        let registry = self.registry.read();
        let mut loaded = 0u64;
        let mut retained = 0u64;
        for (index, line) in text.lines().enumerate() {
            match record::parse_line(line) {
                Ok(None) => {}
                Ok(Some(Record::Header { type_name, last_id })) => {
                    self.identity.restore(&type_name, last_id);
                }
                Ok(Some(Record::Entity(record))) => {
                    if self.identity.observe(&record.type_name, record.id) {
                        debug!(
                            type_name = %record.type_name,
                            id = %record.id,
                            "record identity is ahead of its counter"
                        );
                    }
                    let type_name = record.type_name.clone();
                    let id = record.id;
                    let row: Box<dyn StoredEntity> = match registry.decoder(&type_name) {
                        Some(decode) => decode(&record, &reporter),
                        None => {
                            retained += 1;
                            Box::new(RawRecord(record))
                        }
                    };
                    self.store.put(&type_name, id, row);
                    loaded += 1;
                }
                Err(error) => self.report(&error.at_line(index + 1)),
            }
        }
        drop(registry);

        {
            let mut status = self.status.lock();
            status.pending = 0;
            status.state = DatabaseState::Loaded;
        }
        self.stats.record_load(loaded);
        debug!(records = loaded, retained, "loaded data file");
        Ok(())
    }

    /// Writes every counter and every resident entity to the data file,
    /// replacing its contents.
    ///
    /// Flushes are serialized on the backend, so the file always ends up
    /// with the newest snapshot. Changes made while the snapshot is being
    /// written stay pending and keep the state `Dirty`.
    pub fn save_data(&self) -> CoreResult<()> {
        let mut backend = self.backend.lock();
        let (pending, changes) = {
            let status = self.status.lock();
            (status.pending, status.changes)
        };
        let encoding = self.config.read().encoding;
        let text = self.render();
        let bytes = encoding.encode(&text).map_err(|e| self.reported(e))?;
        let written = backend.replace(&bytes);
        written.map_err(|e| self.reported(e.into()))?;
        drop(backend);

        {
            let mut status = self.status.lock();
            status.pending = status.pending.saturating_sub(pending);
            if status.changes == changes {
                status.state = DatabaseState::Loaded;
            }
        }
        self.stats.record_flush(bytes.len() as u64);
        debug!(bytes = bytes.len(), "flushed data file");
        Ok(())
    }

    /// Same as [`save_data`](Self::save_data).
    pub fn flush(&self) -> CoreResult<()> {
        self.save_data()
    }

    /// Renders the data file: per type, sorted by name, a header followed by
    /// the type's records sorted by identity.
    fn render(&self) -> String {
        let mut out = String::new();
        for type_name in self.type_names() {
            if let Some(last_id) = self.identity.last_id(&type_name) {
                out.push_str(&render_header(&type_name, last_id));
                out.push('\n');
            }
            let lines = self.store.get_all(&type_name, |row| {
                Some(render_entity(&type_name, row.id(), &row.fields()))
            });
            for line in lines {
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    /// Drops every entity and counter from memory. The file is untouched.
    pub fn clear_in_memory(&self) {
        self.store.clear();
        self.identity.clear();
        let mut status = self.status.lock();
        status.pending = 0;
        status.state = DatabaseState::Empty;
    }

    /// Deletes the data file and everything in memory, then loads again.
    ///
    /// If the file cannot be removed the failure is reported and returned,
    /// but memory is still cleared and reloaded from whatever remains on
    /// disk.
    pub fn delete_all_data(&self) -> CoreResult<()> {
        let removed = self.backend.lock().remove();
        let removed = removed.map_err(|e| self.reported(e.into()));
        if let Ok(removed) = removed {
            debug!(removed, "deleted data file");
        }
        self.clear_in_memory();
        self.load_data()?;
        removed.map(|_| ())
    }

    /// Counts a change and flushes if the autosave threshold is exceeded.
    fn after_change(&self) {
        let threshold = self.config.read().autosave_threshold;
        let due = {
            let mut status = self.status.lock();
            status.state = DatabaseState::Dirty;
            status.changes += 1;
            if threshold < 0 {
                false
            } else {
                status.pending += 1;
                status.pending > threshold.unsigned_abs()
            }
        };
        if due {
            self.stats.record_autosave();
            if let Err(error) = self.save_data() {
                debug!(%error, "autosave failed");
            }
        }
    }

    // === Schemas ===

    /// Probes `T` on first use and caches the result. Records of `T` that
    /// were loaded before `T` was known are decoded now.
    fn schema<T: Entity>(&self) -> CoreResult<Arc<Schema<T>>> {
        let cached = self.registry.read().lookup::<T>();
        if let Some(found) = cached {
            return found;
        }

        let mut registry = self.registry.write();
        if let Some(found) = registry.lookup::<T>() {
            return found;
        }
        let schema = registry.register::<T>()?;
        let reporter = |error: &CoreError| self.report(error);
        let hydrated = self.store.replace_with(T::TYPE_NAME, |row| {
            hydrate_raw(row, &schema, &reporter)
        });
        if hydrated > 0 {
            debug!(type_name = T::TYPE_NAME, records = hydrated, "decoded retained records");
        }
        Ok(schema)
    }

    // === Configuration and reporting ===

    /// Returns the in-memory state relative to the data file.
    #[must_use]
    pub fn state(&self) -> DatabaseState {
        self.status.lock().state
    }

    /// Number of saves and deletes not yet flushed.
    #[must_use]
    pub fn pending_changes(&self) -> u64 {
        self.status.lock().pending
    }

    /// Returns the database statistics.
    pub fn stats(&self) -> &DatabaseStats {
        &self.stats
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Changes the autosave threshold. Negative disables autosave.
    pub fn set_autosave_threshold(&self, threshold: i64) {
        self.config.write().autosave_threshold = threshold;
    }

    /// Changes the encoding used by later loads and flushes.
    pub fn set_encoding(&self, encoding: TextEncoding) {
        self.config.write().encoding = encoding;
    }

    /// Replaces the error reporter.
    pub fn set_reporter(&self, reporter: impl ErrorReporter + 'static) {
        *self.reporter.write() = Arc::new(reporter);
    }

    fn reporter(&self) -> Arc<dyn ErrorReporter> {
        Arc::clone(&self.reporter.read())
    }

    fn report(&self, error: &CoreError) {
        self.stats.record_error();
        self.reporter().report(error);
    }

    fn reported(&self, error: CoreError) -> CoreError {
        self.report(&error);
        error
    }
}

fn typed_clone<T: Entity>(row: &dyn StoredEntity) -> Option<T> {
    row.as_any()
        .downcast_ref::<TypedRow<T>>()
        .map(|typed| typed.entity.clone())
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("config", &*self.config.read())
            .field("state", &self.state())
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::SchemaBuilder;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Pear {
        id: EntityId,
        variety: String,
        ripe: bool,
    }

    impl Entity for Pear {
        const TYPE_NAME: &'static str = "Pear";

        fn id(&self) -> EntityId {
            self.id
        }

        fn set_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn describe(schema: &mut SchemaBuilder<Self>) {
            schema
                .value("variety", |p| &p.variety, |p| &mut p.variety)
                .value("ripe", |p| &p.ripe, |p| &mut p.ripe);
        }
    }

    #[derive(Debug, Clone, Default)]
    struct Unnamed {
        id: EntityId,
    }

    impl Entity for Unnamed {
        const TYPE_NAME: &'static str = "";

        fn id(&self) -> EntityId {
            self.id
        }

        fn set_id(&mut self, id: EntityId) {
            self.id = id;
        }

        fn describe(_schema: &mut SchemaBuilder<Self>) {}
    }

    fn pear(variety: &str) -> Pear {
        Pear {
            variety: variety.to_string(),
            ..Pear::default()
        }
    }

    fn memory_db(config: Config) -> (Database, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        (Database::with_backend(config, backend.clone()), backend)
    }

    #[test]
    fn new_database_is_empty() {
        let db = Database::open_in_memory();
        assert_eq!(db.state(), DatabaseState::Empty);
        assert!(db.get_all::<Pear>().unwrap().is_empty());
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let db = Database::open_in_memory();
        let mut a = pear("Conference");
        let mut b = pear("Bosc");
        assert_eq!(db.save_or_update(&mut a).unwrap(), EntityId::new(1));
        assert_eq!(db.save_or_update(&mut b).unwrap(), EntityId::new(2));
        assert_eq!(a.id, EntityId::new(1));
        assert_eq!(db.last_id::<Pear>(), Some(EntityId::new(2)));
    }

    #[test]
    fn resave_keeps_id_and_updates() {
        let db = Database::open_in_memory();
        let mut a = pear("Conference");
        let id = db.save_or_update(&mut a).unwrap();
        a.ripe = true;
        assert_eq!(db.save_or_update(&mut a).unwrap(), id);

        assert_eq!(db.count::<Pear>(), 1);
        assert!(db.get::<Pear>(id).unwrap().unwrap().ripe);
    }

    #[test]
    fn unknown_id_is_replaced() {
        let db = Database::open_in_memory();
        let mut a = pear("Conference");
        a.id = EntityId::new(40);
        assert_eq!(db.save_or_update(&mut a).unwrap(), EntityId::new(1));
    }

    #[test]
    fn not_persistable_is_reported_and_rejected() {
        let db = Database::open_in_memory();
        let reports = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reports);
        db.set_reporter(move |_: &CoreError| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let result = db.save_or_update(&mut Unnamed::default());
        assert!(matches!(result, Err(CoreError::NotPersistable { .. })));
        assert_eq!(reports.load(Ordering::Relaxed), 1);
        assert_eq!(db.state(), DatabaseState::Empty);
        assert_eq!(db.stats().errors(), 1);
    }

    #[test]
    fn flush_writes_headers_then_records() {
        let (db, backend) = memory_db(Config::new().manual_flush());
        db.save_or_update(&mut pear("Bosc")).unwrap();
        db.save_or_update(&mut pear("Con:ference")).unwrap();
        assert_eq!(db.state(), DatabaseState::Dirty);
        assert_eq!(backend.text(), None);

        db.save_data().unwrap();
        assert_eq!(
            backend.text().unwrap(),
            "#Pear:2\nPear;Id:1;variety:Bosc;ripe:0\nPear;Id:2;variety:Con#x#ference;ripe:0\n"
        );
        assert_eq!(db.state(), DatabaseState::Loaded);
        assert_eq!(db.pending_changes(), 0);
    }

    #[test]
    fn delete_reports_absence() {
        let db = Database::open_in_memory();
        let mut a = pear("Bosc");
        assert!(!db.delete(&a).unwrap());

        db.save_or_update(&mut a).unwrap();
        assert!(db.delete(&a).unwrap());
        assert!(!db.delete(&a).unwrap());
        assert_eq!(db.get::<Pear>(a.id).unwrap(), None);

        let mut b = pear("Comice");
        assert_eq!(db.save_or_update(&mut b).unwrap(), EntityId::new(2));
    }

    #[test]
    fn clear_in_memory_resets_counters() {
        let (db, backend) = memory_db(Config::default());
        db.save_or_update(&mut pear("Bosc")).unwrap();
        db.clear_in_memory();

        assert_eq!(db.state(), DatabaseState::Empty);
        assert_eq!(db.last_id::<Pear>(), None);
        assert!(backend.text().unwrap().contains("Bosc"));
    }

    /// Keeps its data but refuses to delete it.
    struct Undeletable(InMemoryBackend);

    impl StorageBackend for Undeletable {
        fn read_all(&self) -> linedb_storage::StorageResult<Option<Vec<u8>>> {
            self.0.read_all()
        }

        fn replace(&mut self, data: &[u8]) -> linedb_storage::StorageResult<()> {
            self.0.replace(data)
        }

        fn remove(&mut self) -> linedb_storage::StorageResult<bool> {
            Err(std::io::Error::other("file is locked").into())
        }

        fn exists(&self) -> linedb_storage::StorageResult<bool> {
            self.0.exists()
        }
    }

    #[test]
    fn failed_delete_all_still_resyncs_memory() {
        let backend = InMemoryBackend::new();
        let db = Database::with_backend(
            Config::new().manual_flush(),
            Undeletable(backend.clone()),
        );
        let reports = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reports);
        db.set_reporter(move |_: &CoreError| {
            counter.fetch_add(1, Ordering::Relaxed);
        });

        db.save_or_update(&mut pear("Bosc")).unwrap();
        db.save_data().unwrap();
        db.save_or_update(&mut pear("Comice")).unwrap();
        assert_eq!(db.count::<Pear>(), 2);

        let result = db.delete_all_data();
        assert!(matches!(result, Err(CoreError::Storage(_))));
        assert_eq!(reports.load(Ordering::Relaxed), 1);

        assert_eq!(db.count::<Pear>(), 1);
        assert_eq!(db.state(), DatabaseState::Loaded);
        assert!(backend.text().unwrap().contains("Bosc"));
    }

    #[test]
    fn manual_flush_tracks_state_without_pending() {
        let (db, _backend) = memory_db(Config::new().manual_flush());
        db.save_or_update(&mut pear("Bosc")).unwrap();
        db.save_data().unwrap();
        assert_eq!(db.state(), DatabaseState::Loaded);

        db.save_or_update(&mut pear("Comice")).unwrap();
        assert_eq!(db.state(), DatabaseState::Dirty);
        assert_eq!(db.pending_changes(), 0);
        db.flush().unwrap();
        assert_eq!(db.state(), DatabaseState::Loaded);
    }

    #[test]
    fn debug_output_names_state() {
        let db = Database::open_in_memory();
        let debug = format!("{db:?}");
        assert!(debug.contains("Empty"));
    }
}
