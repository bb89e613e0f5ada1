//! Database configuration.

use crate::encoding::TextEncoding;
use std::path::{Path, PathBuf};

/// Default name of the data file.
pub const DEFAULT_PATH: &str = "Data.txt";

/// Configuration for opening a database.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the data file.
    pub path: PathBuf,

    /// Encoding used to read and write the data file.
    pub encoding: TextEncoding,

    /// Number of unflushed saves and deletes tolerated before a full flush.
    ///
    /// `0` flushes after every change. A negative value disables autosave.
    pub autosave_threshold: i64,

    /// Whether to create missing parent directories of `path` on flush.
    pub create_dirs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PATH),
            encoding: TextEncoding::Utf8,
            autosave_threshold: 0,
            create_dirs: false,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the data file path.
    #[must_use]
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = path.as_ref().to_path_buf();
        self
    }

    /// Sets the text encoding.
    #[must_use]
    pub const fn encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets the autosave threshold.
    #[must_use]
    pub const fn autosave_threshold(mut self, threshold: i64) -> Self {
        self.autosave_threshold = threshold;
        self
    }

    /// Disables autosave. Changes are written only by an explicit flush.
    #[must_use]
    pub const fn manual_flush(self) -> Self {
        self.autosave_threshold(-1)
    }

    /// Sets whether to create missing parent directories.
    #[must_use]
    pub const fn create_dirs(mut self, value: bool) -> Self {
        self.create_dirs = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.path, PathBuf::from("Data.txt"));
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert_eq!(config.autosave_threshold, 0);
        assert!(!config.create_dirs);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .path("store/fruit.txt")
            .encoding(TextEncoding::Latin1)
            .autosave_threshold(10)
            .create_dirs(true);

        assert_eq!(config.path, PathBuf::from("store/fruit.txt"));
        assert_eq!(config.encoding, TextEncoding::Latin1);
        assert_eq!(config.autosave_threshold, 10);
        assert!(config.create_dirs);
    }

    #[test]
    fn manual_flush_disables_autosave() {
        assert_eq!(Config::new().manual_flush().autosave_threshold, -1);
    }
}
