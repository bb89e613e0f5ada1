//! Database statistics.
//!
//! # Usage
//!
//! ```rust
//! use linedb_core::Database;
//!
//! let db = Database::open_in_memory();
//! db.save_data().unwrap();
//!
//! let stats = db.stats();
//! assert_eq!(stats.flushes(), 1);
//! assert_eq!(stats.saves(), 0);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters of database activity.
///
/// All counters are atomic and can be read while operations are in
/// progress. They only grow.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    /// Entities saved, including cascaded children.
    saves: AtomicU64,
    /// Children saved as part of a parent's save.
    cascaded_saves: AtomicU64,
    /// Entities removed by delete.
    deletes: AtomicU64,
    /// Typed reads (`get`, `get_all`, `load_object`).
    reads: AtomicU64,

    /// Data file loads that found a file.
    loads: AtomicU64,
    /// Entity records read from the data file.
    records_loaded: AtomicU64,
    /// Full flushes, explicit or autosave.
    flushes: AtomicU64,
    /// Flushes triggered by the autosave threshold.
    autosaves: AtomicU64,
    /// Bytes written by flushes.
    bytes_written: AtomicU64,

    /// Failures passed to the error reporter.
    errors: AtomicU64,
}

impl DatabaseStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_save(&self) {
        self.saves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cascaded_save(&self) {
        self.cascaded_saves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_load(&self, records: u64) {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.records_loaded.fetch_add(records, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self, bytes: u64) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_autosave(&self) {
        self.autosaves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of saved entities, including cascaded children.
    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::Relaxed)
    }

    /// Returns the number of children saved by a cascade.
    pub fn cascaded_saves(&self) -> u64 {
        self.cascaded_saves.load(Ordering::Relaxed)
    }

    /// Returns the number of deleted entities.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of typed reads.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of data file loads.
    pub fn loads(&self) -> u64 {
        self.loads.load(Ordering::Relaxed)
    }

    /// Returns the number of entity records read from the data file.
    pub fn records_loaded(&self) -> u64 {
        self.records_loaded.load(Ordering::Relaxed)
    }

    /// Returns the number of flushes.
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Returns the number of flushes triggered by autosave.
    pub fn autosaves(&self) -> u64 {
        self.autosaves.load(Ordering::Relaxed)
    }

    /// Returns the total bytes written by flushes.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Returns the number of reported failures.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_start_at_zero() {
        let stats = DatabaseStats::new();
        assert_eq!(stats.saves(), 0);
        assert_eq!(stats.flushes(), 0);
        assert_eq!(stats.errors(), 0);
    }

    #[test]
    fn record_methods() {
        let stats = DatabaseStats::new();
        stats.record_save();
        stats.record_save();
        stats.record_cascaded_save();
        stats.record_delete();
        stats.record_read();
        stats.record_load(5);
        stats.record_flush(100);
        stats.record_flush(50);
        stats.record_autosave();
        stats.record_error();

        assert_eq!(stats.saves(), 2);
        assert_eq!(stats.cascaded_saves(), 1);
        assert_eq!(stats.deletes(), 1);
        assert_eq!(stats.reads(), 1);
        assert_eq!(stats.loads(), 1);
        assert_eq!(stats.records_loaded(), 5);
        assert_eq!(stats.flushes(), 2);
        assert_eq!(stats.autosaves(), 1);
        assert_eq!(stats.bytes_written(), 150);
        assert_eq!(stats.errors(), 1);
    }
}
