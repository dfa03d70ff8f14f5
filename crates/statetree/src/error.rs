//! Error types for tree decoding and patch compilation.

use thiserror::Error;

/// Errors raised while reading, expanding or compiling resource trees.
///
/// Every variant names the attribute path that caused it so the schema
/// layer can point the user at the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Attribute path could not be parsed
    #[error("invalid attribute path '{path}': {reason}")]
    InvalidPath {
        /// The path as written
        path: String,
        /// Why it was rejected
        reason: String,
    },

    /// Field holds a value of the wrong kind
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Attribute path of the field
        path: String,
        /// Kind the decoder wanted
        expected: &'static str,
        /// Kind actually present
        found: &'static str,
    },

    /// Required field is absent
    #[error("{path}: required field is missing")]
    MissingField {
        /// Attribute path of the missing field
        path: String,
    },

    /// More than one shape of a mutually exclusive group is populated
    #[error("{path}: only one of {} may be set", .found.join(", "))]
    ConflictingShapes {
        /// Attribute path of the element
        path: String,
        /// The populated shape keys, in priority order
        found: Vec<String>,
    },

    /// None of the shapes of a mutually exclusive group is populated
    #[error("{path}: exactly one of {} must be set", .expected.join(", "))]
    MissingShape {
        /// Attribute path of the element
        path: String,
        /// Every shape key the element could use
        expected: Vec<String>,
    },

    /// Integer does not fit the target type
    #[error("{path}: value {value} is out of range")]
    OutOfRange {
        /// Attribute path of the field
        path: String,
        /// The offending value
        value: i64,
    },

    /// String value outside the allowed set
    #[error("{path}: '{value}' is not one of {}", .allowed.join(", "))]
    InvalidValue {
        /// Attribute path of the field
        path: String,
        /// The offending value
        value: String,
        /// Accepted values
        allowed: Vec<String>,
    },
}

/// Result type for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
