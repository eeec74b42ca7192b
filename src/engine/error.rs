//! Error types for engine calls.

use thiserror::Error;

use super::DownloadId;

/// Errors an engine may report for a command or query.
///
/// The orchestrator logs these and keeps replying; record state is the only
/// failure signal that reaches the UI.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No record with this id.
    #[error("no download with id {id}")]
    NotFound {
        /// The unknown id.
        id: DownloadId,
    },

    /// The command does not apply to the record's current state.
    #[error("cannot {action} download {id}: {reason}")]
    InvalidTransition {
        /// The record the command targeted.
        id: DownloadId,
        /// The attempted command.
        action: &'static str,
        /// Why the engine refused.
        reason: String,
    },

    /// The engine is not accepting calls.
    #[error("engine unavailable: {0}")]
    Unavailable(String),
}

impl EngineError {
    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(id: DownloadId) -> Self {
        Self::NotFound { id }
    }

    /// Creates an invalid transition error.
    pub fn invalid_transition(id: DownloadId, action: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidTransition {
            id,
            action,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            EngineError::not_found(DownloadId(4)).to_string(),
            "no download with id 4"
        );
    }

    #[test]
    fn test_invalid_transition_message() {
        let msg = EngineError::invalid_transition(DownloadId(2), "resume", "already complete")
            .to_string();
        assert!(msg.contains("resume"));
        assert!(msg.contains("already complete"));
    }
}
