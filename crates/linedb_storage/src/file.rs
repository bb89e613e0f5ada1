//! File-based storage backend for persistent storage.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// A file-based storage backend.
///
/// This backend keeps the database in a single file on disk. Data survives
/// process restarts.
///
/// # Durability
///
/// `replace` truncates the file, writes the new contents through a buffered
/// writer and flushes it. It does not write to a temporary file first, so a
/// crash during `replace` can leave a partial file behind.
///
/// # Example
///
/// ```no_run
/// use linedb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::new(Path::new("Data.txt"));
/// backend.replace(b"#Apple:1\n").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
    create_dirs: bool,
}

impl FileBackend {
    /// Creates a backend for the file at `path`.
    ///
    /// The file itself is not touched until the first read or write. Its
    /// parent directory must exist by the time the file is written.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            create_dirs: false,
        }
    }

    /// Creates a backend that creates missing parent directories on write.
    #[must_use]
    pub fn with_create_dirs(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            create_dirs: true,
        }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> StorageResult<()> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() || parent.exists() {
            return Ok(());
        }
        if self.create_dirs {
            fs::create_dir_all(parent)?;
            Ok(())
        } else {
            Err(StorageError::MissingDirectory {
                path: self.path.clone(),
            })
        }
    }
}

impl StorageBackend for FileBackend {
    fn read_all(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        self.ensure_parent()?;
        let mut writer = BufWriter::new(File::create(&self.path)?);
        writer.write_all(data)?;
        writer.flush()?;
        Ok(())
    }

    fn remove(&mut self) -> StorageResult<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self) -> StorageResult<bool> {
        Ok(self.path.try_exists()?)
    }
}
