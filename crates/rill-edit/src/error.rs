//! Error types for document edits.

use crate::Path;
use thiserror::Error;

/// Result type alias for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// Errors raised by edit operations.
#[derive(Debug, Error)]
pub enum EditError {
    /// The addressed location does not exist in the document.
    #[error("path not found: {path}")]
    PathNotFound {
        /// The path that was not found.
        path: Path,
    },

    /// Array index outside the array's bounds.
    #[error("index {index} out of bounds (len: {len}) at path {path}")]
    IndexOutOfBounds {
        /// The path to the array.
        path: Path,
        /// The offending index.
        index: usize,
        /// The array's length.
        len: usize,
    },

    /// The value at a path has the wrong JSON type for the operation.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The path where the mismatch occurred.
        path: Path,
        /// The type the operation requires.
        expected: &'static str,
        /// The type actually present.
        found: &'static str,
    },

    /// Merge was given a non-object value to merge in.
    #[error("merge requires an object value at {path}")]
    MergeRequiresObject {
        /// The path being merged into.
        path: Path,
    },
}

impl EditError {
    #[inline]
    pub fn path_not_found(path: Path) -> Self {
        EditError::PathNotFound { path }
    }

    #[inline]
    pub fn index_out_of_bounds(path: Path, index: usize, len: usize) -> Self {
        EditError::IndexOutOfBounds { path, index, len }
    }

    #[inline]
    pub fn type_mismatch(path: Path, expected: &'static str, found: &'static str) -> Self {
        EditError::TypeMismatch {
            path,
            expected,
            found,
        }
    }

    #[inline]
    pub fn merge_requires_object(path: Path) -> Self {
        EditError::MergeRequiresObject { path }
    }
}

/// The JSON type name of a value, for error messages.
#[inline]
pub fn value_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
