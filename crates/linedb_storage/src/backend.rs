//! Storage backend trait definition.

use crate::error::StorageResult;

/// A whole-file byte store for LineDB.
///
/// The database file is small enough to be handled as a unit: it is read
/// completely on load and replaced completely on flush. Backends never
/// append or patch in place.
///
/// # Invariants
///
/// - `read_all` returns `None` when nothing has been stored (a missing file
///   is an empty database, not an error)
/// - `read_all` after a successful `replace` returns exactly the replaced bytes
/// - `remove` on an absent store succeeds and returns `false`
/// - Backends must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing
/// - [`super::FileBackend`] - For persistent storage
pub trait StorageBackend: Send + Sync {
    /// Reads the full contents, or `None` if the store does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read.
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Replaces the full contents with `data`, creating the store if needed.
    ///
    /// There is no partial-write recovery: a failure midway may leave the
    /// store truncated.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Removes the store. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be removed.
    fn remove(&mut self) -> StorageResult<bool>;

    /// Returns whether the store currently exists.
    ///
    /// # Errors
    ///
    /// Returns an error if existence cannot be determined.
    fn exists(&self) -> StorageResult<bool>;
}
