//! Contract with the external download engine.
//!
//! The engine owns every transfer: queueing, segment splitting, retries, and
//! disk I/O all happen behind [`DownloadEngine`]. The orchestrator only issues
//! commands, runs queries, and listens to the change stream; it never caches
//! record state.
//!
//! [`MemoryEngine`] is an in-process implementation that keeps records in
//! memory and moves no bytes. It backs the stdio binary and the tests.

mod error;
mod memory;
mod record;

pub use error::EngineError;
pub use memory::{MemoryEngine, Submission};
pub use record::{
    ChangeInfo, Delta, DownloadId, DownloadOptions, DownloadRecord, DownloadState, SearchQuery,
};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::config::ConfigurationProfile;

/// Operations the orchestrator expects from a download engine.
///
/// Implementations are shared between the router, the update loop, and the
/// change listener, so every method takes `&self` and must tolerate
/// concurrent calls.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    /// Returns every record matching `query`.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DownloadRecord>, EngineError>;

    /// Starts a transfer and returns its id.
    async fn download(
        &self,
        options: DownloadOptions,
        profile: &ConfigurationProfile,
    ) -> Result<DownloadId, EngineError>;

    /// Cancels a transfer.
    async fn cancel(&self, id: DownloadId) -> Result<(), EngineError>;

    /// Resumes a paused or interrupted transfer.
    async fn resume(&self, id: DownloadId) -> Result<(), EngineError>;

    /// Pauses a transfer.
    async fn pause(&self, id: DownloadId) -> Result<(), EngineError>;

    /// Forgets every record matching `query`, returning the erased ids.
    async fn erase(&self, query: &SearchQuery) -> Result<Vec<DownloadId>, EngineError>;

    /// Returns an icon reference for the record's file type, if any.
    async fn file_icon(&self, id: DownloadId, size: u32) -> Result<Option<String>, EngineError>;

    /// Subscribes to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<ChangeInfo>;
}
