//! Key = value profile file loading.
//!
//! ```text
//! # ~/.config/download-orchestrator/profile.conf
//! max-number-of-threads = 5
//! use-native-when-possible = false   # always segment
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{ConfigError, ConfigurationProfile, THREAD_CEILING};

const APP_DIR: &str = "download-orchestrator";
const PROFILE_FILE: &str = "profile.conf";

/// Resolves the default profile path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/download-orchestrator/profile.conf`
/// 2. `$HOME/.config/download-orchestrator/profile.conf`
#[must_use]
pub fn resolve_default_profile_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config_home).join(APP_DIR).join(PROFILE_FILE));
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(PROFILE_FILE),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads a profile file, layering its keys over the default profile.
///
/// A missing file yields the default profile.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or contains invalid
/// lines.
pub fn load_profile_file(path: &Path) -> Result<ConfigurationProfile, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "No profile file, using defaults");
        return Ok(ConfigurationProfile::default());
    }
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let profile = parse_profile_str(&raw)?;
    debug!(path = %path.display(), ?profile, "Loaded profile file");
    Ok(profile)
}

/// Parses profile file contents over the default profile.
///
/// # Errors
///
/// Returns [`ConfigError`] on syntax errors, unknown keys, or invalid values.
pub fn parse_profile_str(raw: &str) -> Result<ConfigurationProfile, ConfigError> {
    let mut profile = ConfigurationProfile::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line_no = line_index + 1;
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            return Err(ConfigError::Syntax { line: line_no });
        };
        let key = raw_key.trim();
        let value = raw_value.trim();

        match key {
            "use-native-when-possible" => {
                profile.use_native_when_possible = parse_boolean(key, value, line_no)?;
            }
            "min-segment-size" => {
                profile.min_segment_size = parse_integer_u64(key, value, line_no)?;
            }
            "max-segment-size" => {
                profile.max_segment_size = parse_integer_u64(key, value, line_no)?;
            }
            "overwrite-segment-size" => {
                profile.overwrite_segment_size = parse_boolean(key, value, line_no)?;
            }
            "max-number-of-threads" => {
                let threads = parse_integer_u32(key, value, line_no)?;
                if !(1..=THREAD_CEILING).contains(&threads) {
                    return Err(ConfigError::invalid_value(
                        key,
                        value,
                        line_no,
                        format!("expected range 1..={THREAD_CEILING}"),
                    ));
                }
                profile.max_number_of_threads = threads;
            }
            "max-retires" | "max-retries" => {
                profile.max_retries = parse_integer_u32(key, value, line_no)?;
            }
            "speed-over-seconds" => {
                profile.speed_over_seconds = parse_integer_u32(key, value, line_no)?;
            }
            "max-simultaneous-writes" => {
                profile.max_simultaneous_writes = parse_integer_u32(key, value, line_no)?;
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    key: key.to_string(),
                    line: line_no,
                });
            }
        }
    }

    if profile.min_segment_size > profile.max_segment_size {
        return Err(ConfigError::Inconsistent {
            reason: format!(
                "min-segment-size ({}) exceeds max-segment-size ({})",
                profile.min_segment_size, profile.max_segment_size
            ),
        });
    }

    Ok(profile)
}

fn strip_inline_comment(line: &str) -> &str {
    match line.find('#') {
        Some(index) => &line[..index],
        None => line,
    }
}

fn parse_boolean(key: &str, value: &str, line: usize) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::invalid_value(
            key,
            value,
            line,
            "expected 'true' or 'false'",
        )),
    }
}

fn parse_integer_u64(key: &str, value: &str, line: usize) -> Result<u64, ConfigError> {
    value
        .parse::<u64>()
        .map_err(|e| ConfigError::invalid_value(key, value, line, e.to_string()))
}

fn parse_integer_u32(key: &str, value: &str, line: usize) -> Result<u32, ConfigError> {
    value
        .parse::<u32>()
        .map_err(|e| ConfigError::invalid_value(key, value, line, e.to_string()))
}
