//! Error types for profile loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a profile file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The profile file exists but could not be read.
    #[error("failed to read profile file '{path}': {source}")]
    Io {
        /// Path of the profile file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A line is not of the form `key = value`.
    #[error("invalid profile syntax on line {line}: expected key = value")]
    Syntax {
        /// 1-based line number.
        line: usize,
    },

    /// The key is not a profile field.
    #[error("unknown profile key `{key}` on line {line}")]
    UnknownKey {
        /// The unrecognized key.
        key: String,
        /// 1-based line number.
        line: usize,
    },

    /// The value does not parse or is out of range for its key.
    #[error("invalid `{key}` value '{value}' on line {line}: {reason}")]
    InvalidValue {
        /// Key the value belongs to.
        key: String,
        /// The raw value.
        value: String,
        /// 1-based line number.
        line: usize,
        /// Why it was rejected.
        reason: String,
    },

    /// Individually valid values contradict each other.
    #[error("inconsistent profile: {reason}")]
    Inconsistent {
        /// Which values conflict.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an IO error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(key: &str, value: &str, line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            line,
            reason: reason.into(),
        }
    }
}
