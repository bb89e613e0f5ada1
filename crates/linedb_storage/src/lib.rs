//! # LineDB Storage
//!
//! Storage backend trait and implementations for LineDB.
//!
//! LineDB keeps its whole database in one text file that is read in full on
//! load and rewritten in full on every flush. Backends are **opaque byte
//! stores** for that file: they do not know about records, headers or the
//! escape table.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral databases
//! - [`FileBackend`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use linedb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! assert!(backend.read_all().unwrap().is_none());
//!
//! backend.replace(b"#Apple:1\n").unwrap();
//! assert_eq!(backend.read_all().unwrap().unwrap(), b"#Apple:1\n");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
