//! Download tuning profile handed to the engine with every submission.
//!
//! The orchestrator never interprets these values beyond the thread-count
//! ceiling; it merges per-link overrides and passes the profile through.
//!
//! # Example
//!
//! ```
//! use orchestrator_core::config::{ConfigurationProfile, THREAD_CEILING};
//!
//! let profile = ConfigurationProfile::default().with_thread_override(64);
//! assert_eq!(profile.max_number_of_threads, THREAD_CEILING);
//! ```

mod error;
mod file;

pub use error::ConfigError;
pub use file::{load_profile_file, parse_profile_str, resolve_default_profile_path};

use serde::{Deserialize, Serialize};

/// Upper bound for any requested thread count, default or per-link.
pub const THREAD_CEILING: u32 = 8;

/// Thread count used for `add-new` entries without a `<n>|` prefix.
pub const DEFAULT_LINK_THREADS: u32 = 3;

/// Default minimum segment size (100 KiB).
pub const DEFAULT_MIN_SEGMENT_SIZE: u64 = 100 * 1024;

/// Default maximum segment size (100 MiB).
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 100 * 1024 * 1024;

/// Immutable set of engine tuning parameters.
///
/// Serialized with the kebab-case keys the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfigurationProfile {
    /// Prefer the host's own download handling when the engine can.
    pub use_native_when_possible: bool,
    /// Smallest segment the engine may split a transfer into, in bytes.
    pub min_segment_size: u64,
    /// Largest single downloading segment, in bytes.
    pub max_segment_size: u64,
    /// Let the engine recompute segment sizes for a transfer.
    pub overwrite_segment_size: bool,
    /// Concurrent connections per transfer, never above [`THREAD_CEILING`].
    pub max_number_of_threads: u32,
    /// Retry ceiling per segment.
    // The engine reads the misspelled key.
    #[serde(rename = "max-retires", alias = "max-retries")]
    pub max_retries: u32,
    /// Window for speed averaging, in seconds.
    pub speed_over_seconds: u32,
    /// Concurrent disk writes.
    pub max_simultaneous_writes: u32,
}

impl Default for ConfigurationProfile {
    fn default() -> Self {
        Self {
            use_native_when_possible: true,
            min_segment_size: DEFAULT_MIN_SEGMENT_SIZE,
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            overwrite_segment_size: true,
            max_number_of_threads: DEFAULT_LINK_THREADS,
            max_retries: 10,
            speed_over_seconds: 10,
            max_simultaneous_writes: 3,
        }
    }
}

impl ConfigurationProfile {
    /// Returns a request-scoped copy with the thread count replaced.
    ///
    /// The requested value is clamped to [`THREAD_CEILING`]; a request of
    /// zero yields at least one thread.
    #[must_use]
    pub fn with_thread_override(&self, threads: u32) -> Self {
        Self {
            max_number_of_threads: clamp_threads(threads),
            ..self.clone()
        }
    }
}

/// Clamps a thread count into `1..=THREAD_CEILING`.
#[must_use]
pub fn clamp_threads(threads: u32) -> u32 {
    threads.clamp(1, THREAD_CEILING)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_engine_defaults() {
        let profile = ConfigurationProfile::default();
        assert!(profile.use_native_when_possible);
        assert_eq!(profile.min_segment_size, 102_400);
        assert_eq!(profile.max_segment_size, 104_857_600);
        assert!(profile.overwrite_segment_size);
        assert_eq!(profile.max_number_of_threads, 3);
        assert_eq!(profile.max_retries, 10);
        assert_eq!(profile.speed_over_seconds, 10);
        assert_eq!(profile.max_simultaneous_writes, 3);
    }

    #[test]
    fn test_thread_override_is_clamped_to_ceiling() {
        let base = ConfigurationProfile::default();
        assert_eq!(base.with_thread_override(5).max_number_of_threads, 5);
        assert_eq!(base.with_thread_override(8).max_number_of_threads, 8);
        assert_eq!(base.with_thread_override(9).max_number_of_threads, 8);
        assert_eq!(base.with_thread_override(u32::MAX).max_number_of_threads, 8);
    }

    #[test]
    fn test_thread_override_leaves_other_fields_untouched() {
        let base = ConfigurationProfile {
            max_retries: 2,
            ..ConfigurationProfile::default()
        };
        let scoped = base.with_thread_override(6);
        assert_eq!(scoped.max_retries, 2);
        assert_eq!(base.max_number_of_threads, 3, "base is not mutated");
    }

    #[test]
    fn test_profile_serializes_with_engine_keys() {
        let json = serde_json::to_value(ConfigurationProfile::default()).unwrap();
        assert_eq!(json["use-native-when-possible"], true);
        assert_eq!(json["max-number-of-threads"], 3);
        assert_eq!(json["max-retires"], 10);
        assert_eq!(json["max-simultaneous-writes"], 3);
    }

    #[test]
    fn test_profile_deserializes_partial_object_over_defaults() {
        let profile: ConfigurationProfile =
            serde_json::from_str(r#"{"max-retries": 4, "speed-over-seconds": 5}"#).unwrap();
        assert_eq!(profile.max_retries, 4);
        assert_eq!(profile.speed_over_seconds, 5);
        assert_eq!(profile.max_number_of_threads, 3);
    }
}
