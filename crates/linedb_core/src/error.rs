//! Error types for LineDB core.

use linedb_codec::CodecError;
use linedb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in LineDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Value codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The type cannot be persisted.
    #[error("type {type_name} is not persistable: {reason}")]
    NotPersistable {
        /// Name the type declared.
        type_name: String,
        /// Why the type was rejected.
        reason: String,
    },

    /// A property of a loaded record could not be decoded.
    ///
    /// The property keeps its default value and the rest of the record is
    /// still loaded.
    #[error("cannot decode {type_name}.{property}: {source}")]
    Decode {
        /// Entity type name.
        type_name: String,
        /// Property name.
        property: String,
        /// Underlying codec error.
        #[source]
        source: CodecError,
    },

    /// A line of the data file is not a valid record.
    #[error("malformed record on line {line}: {message}")]
    MalformedRecord {
        /// One-based line number, or 0 when unknown.
        line: usize,
        /// Description of the problem.
        message: String,
    },

    /// Text could not be converted to or from the configured encoding.
    #[error("text encoding error: {message}")]
    Encoding {
        /// Description of the problem.
        message: String,
    },
}

impl CoreError {
    /// Create a not persistable error.
    pub fn not_persistable(type_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotPersistable {
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a property decode error.
    pub fn decode(
        type_name: impl Into<String>,
        property: impl Into<String>,
        source: CodecError,
    ) -> Self {
        Self::Decode {
            type_name: type_name.into(),
            property: property.into(),
            source,
        }
    }

    /// Create a malformed record error.
    pub fn malformed_record(line: usize, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            line,
            message: message.into(),
        }
    }

    /// Create an encoding error.
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }

    /// Returns the same error with the given line number, if it is a
    /// malformed record error.
    #[must_use]
    pub fn at_line(self, line: usize) -> Self {
        match self {
            Self::MalformedRecord { message, .. } => Self::MalformedRecord { line, message },
            other => other,
        }
    }
}
