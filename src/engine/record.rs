//! Engine-side data types: records, queries, and change notifications.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier issued by the engine for one transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DownloadId(pub u64);

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for DownloadId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Lifecycle state of a transfer as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadState {
    /// Accepted but not started.
    Queued,
    /// Bytes are moving (or the transfer is paused mid-way).
    InProgress,
    /// Stopped by the user.
    Paused,
    /// All bytes received.
    Complete,
    /// Cancelled or failed.
    Interrupted,
    /// Handed off to the host's own download handling.
    Transfer,
}

impl DownloadState {
    /// Returns the wire string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Complete => "complete",
            Self::Interrupted => "interrupted",
            Self::Transfer => "transfer",
        }
    }

    /// Whether a change into this state should be pushed to the UI as a
    /// record update on its own.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Complete | Self::Interrupted | Self::Transfer)
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One transfer as known to the engine.
///
/// Only the engine mutates records; the orchestrator reads snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRecord {
    /// Stable identifier.
    pub id: DownloadId,
    /// Source URL.
    pub url: String,
    /// Current lifecycle state.
    pub state: DownloadState,
    /// Bytes written so far.
    pub bytes_received: u64,
    /// Expected size, 0 when unknown.
    pub total_bytes: u64,
    /// Whether the transfer is paused.
    pub paused: bool,
    /// Destination file name once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Whether the engine handed the transfer to the host.
    #[serde(default)]
    pub native: bool,
}

/// Query-shaped filter passed through to [`DownloadEngine::search`].
///
/// Absent fields match every record.
///
/// [`DownloadEngine::search`]: super::DownloadEngine::search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Match a single record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DownloadId>,
    /// Match records in this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DownloadState>,
    /// Match records downloading this URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Match records by paused flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
}

impl SearchQuery {
    /// Query for one record by id.
    #[must_use]
    pub fn by_id(id: DownloadId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Query for all records in a state.
    #[must_use]
    pub fn by_state(state: DownloadState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Whether `record` satisfies every present field.
    #[must_use]
    pub fn matches(&self, record: &DownloadRecord) -> bool {
        self.id.is_none_or(|id| record.id == id)
            && self.state.is_none_or(|state| record.state == state)
            && self.url.as_deref().is_none_or(|url| record.url == url)
            && self.paused.is_none_or(|paused| record.paused == paused)
    }
}

/// Options for a new transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadOptions {
    /// URL handed to the engine verbatim.
    pub url: String,
}

impl DownloadOptions {
    /// Options for downloading `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// Before/after pair for a field in a [`ChangeInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta<T> {
    /// New value.
    pub current: T,
    /// Value before the change, when the engine reports it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<T>,
}

impl<T> Delta<T> {
    /// Delta with both sides known.
    pub fn new(previous: Option<T>, current: T) -> Self {
        Self { current, previous }
    }
}

/// A change notification from the engine's stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeInfo {
    /// Record the change applies to.
    pub id: DownloadId,
    /// The engine relinquished the record to native handling.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub native: bool,
    /// State transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Delta<DownloadState>>,
    /// Destination file name became known or changed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<Delta<String>>,
    /// Pause flag flipped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<Delta<bool>>,
    /// Bytes received after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_received: Option<u64>,
    /// Total bytes after the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
}

impl ChangeInfo {
    /// Empty change for `id`; callers fill in the fields that moved.
    #[must_use]
    pub fn for_id(id: DownloadId) -> Self {
        Self {
            id,
            native: false,
            state: None,
            filename: None,
            paused: None,
            bytes_received: None,
            total_bytes: None,
        }
    }
}
