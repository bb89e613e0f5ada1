//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a property value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The token could not be parsed as the requested kind.
    #[error("malformed {kind} token {token:?}")]
    Malformed {
        /// Name of the kind that was being decoded.
        kind: &'static str,
        /// The offending token.
        token: String,
    },

    /// A value of one kind was found where another was expected.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected kind or element type name.
        expected: String,
        /// Kind or element type name actually found.
        found: String,
    },

    /// A symbol name does not belong to its enumeration.
    #[error("unknown symbol {name:?} for {type_name}")]
    UnknownSymbol {
        /// The enumeration's type name.
        type_name: &'static str,
        /// The name that was read.
        name: String,
    },

    /// A decoded number does not fit the target field.
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// The target Rust type.
        target: &'static str,
        /// The decoded value.
        value: String,
    },
}

impl CodecError {
    /// Create a malformed token error.
    pub fn malformed(kind: &'static str, token: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            token: token.into(),
        }
    }

    /// Create a type mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an unknown symbol error.
    pub fn unknown_symbol(type_name: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownSymbol {
            type_name,
            name: name.into(),
        }
    }

    /// Create an out of range error.
    pub fn out_of_range(target: &'static str, value: impl ToString) -> Self {
        Self::OutOfRange {
            target,
            value: value.to_string(),
        }
    }
}
