//! CLI command implementations.

pub mod dump;
pub mod inspect;
pub mod verify;

use linedb_core::record::{self, Record};
use linedb_core::{CoreError, TextEncoding};
use linedb_storage::{FileBackend, StorageBackend, StorageError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors reported by the commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The data file does not exist.
    #[error("no data file at {}", path.display())]
    NoDataFile {
        /// Path that was tried.
        path: PathBuf,
    },

    /// The data file could not be read.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The data file could not be decoded.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// JSON output could not be produced.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// `verify` found problems.
    #[error("verification failed with {problems} problem(s)")]
    VerifyFailed {
        /// Number of problems found.
        problems: usize,
    },

    /// Unknown `--format` value.
    #[error("unknown output format {0:?}")]
    UnknownFormat(String),
}

/// Output format shared by the commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl Format {
    /// Parses a `--format` value.
    pub fn parse(value: &str) -> Result<Self, CliError> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// One non-blank line of a data file.
#[derive(Debug)]
pub struct Line {
    /// One-based line number.
    pub number: usize,
    /// The parsed record, or why it could not be parsed.
    pub parsed: Result<Record, CoreError>,
}

/// A data file read and split into records, without touching any schema.
#[derive(Debug)]
pub struct DataFile {
    /// Path of the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Non-blank lines in file order.
    pub lines: Vec<Line>,
}

impl DataFile {
    /// Reads and parses the data file at `path`.
    pub fn read(path: &Path, encoding: TextEncoding) -> Result<Self, CliError> {
        let bytes = FileBackend::new(path)
            .read_all()?
            .ok_or_else(|| CliError::NoDataFile {
                path: path.to_path_buf(),
            })?;
        let text = encoding.decode(&bytes)?;
        let file = Self::parse(path, bytes.len() as u64, &text);
        debug!(path = %path.display(), lines = file.lines.len(), "read data file");
        Ok(file)
    }

    /// Parses already decoded file contents.
    pub fn parse(path: &Path, size: u64, text: &str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .filter_map(|(index, line)| {
                let number = index + 1;
                match record::parse_line(line) {
                    Ok(None) => None,
                    Ok(Some(parsed)) => Some(Line {
                        number,
                        parsed: Ok(parsed),
                    }),
                    Err(e) => Some(Line {
                        number,
                        parsed: Err(e.at_line(number)),
                    }),
                }
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            size,
            lines,
        }
    }

    /// Iterates over the well-formed records with their line numbers.
    pub fn records(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.lines
            .iter()
            .filter_map(|line| line.parsed.as_ref().ok().map(|r| (line.number, r)))
    }

    /// Iterates over the malformed lines.
    pub fn malformed(&self) -> impl Iterator<Item = (usize, &CoreError)> {
        self.lines
            .iter()
            .filter_map(|line| line.parsed.as_ref().err().map(|e| (line.number, e)))
    }
}
