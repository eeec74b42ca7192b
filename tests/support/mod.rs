//! Shared doubles for the integration tests.
//!
//! - [`CountingEngine`] wraps the in-memory engine and logs every call
//! - [`ScriptedPage`] answers menu prompts from a script and records them

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orchestrator_core::config::ConfigurationProfile;
use orchestrator_core::engine::{
    ChangeInfo, DownloadEngine, DownloadId, DownloadOptions, DownloadRecord, DownloadState,
    EngineError, MemoryEngine, SearchQuery,
};
use orchestrator_core::menu::{ActivePage, SelectionSnapshot};
use orchestrator_core::ui::Broadcast;
use tokio::sync::broadcast;

/// One call received by a [`CountingEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Search(SearchQuery),
    Download { url: String, threads: u32 },
    Cancel(DownloadId),
    Resume(DownloadId),
    Pause(DownloadId),
    Erase(SearchQuery),
    FileIcon(DownloadId, u32),
}

/// Engine double: delegates to a [`MemoryEngine`] and keeps a call log.
/// Searches can be switched to fail.
#[derive(Debug, Default)]
pub struct CountingEngine {
    pub inner: MemoryEngine,
    calls: Mutex<Vec<EngineCall>>,
    fail_searches: AtomicBool,
}

impl CountingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Number of `search` calls for the in-progress set, i.e. poll cycles.
    pub fn poll_count(&self) -> usize {
        let polling = SearchQuery::by_state(DownloadState::InProgress);
        self.calls()
            .iter()
            .filter(|call| **call == EngineCall::Search(polling.clone()))
            .count()
    }

    pub fn downloads(&self) -> Vec<(String, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Download { url, threads } => Some((url, threads)),
                _ => None,
            })
            .collect()
    }

    pub fn fail_searches(&self, fail: bool) {
        self.fail_searches.store(fail, Ordering::SeqCst);
    }

    fn log(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DownloadEngine for CountingEngine {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DownloadRecord>, EngineError> {
        self.log(EngineCall::Search(query.clone()));
        if self.fail_searches.load(Ordering::SeqCst) {
            return Err(EngineError::Unavailable("search disabled".to_string()));
        }
        self.inner.search(query).await
    }

    async fn download(
        &self,
        options: DownloadOptions,
        profile: &ConfigurationProfile,
    ) -> Result<DownloadId, EngineError> {
        self.log(EngineCall::Download {
            url: options.url.clone(),
            threads: profile.max_number_of_threads,
        });
        self.inner.download(options, profile).await
    }

    async fn cancel(&self, id: DownloadId) -> Result<(), EngineError> {
        self.log(EngineCall::Cancel(id));
        self.inner.cancel(id).await
    }

    async fn resume(&self, id: DownloadId) -> Result<(), EngineError> {
        self.log(EngineCall::Resume(id));
        self.inner.resume(id).await
    }

    async fn pause(&self, id: DownloadId) -> Result<(), EngineError> {
        self.log(EngineCall::Pause(id));
        self.inner.pause(id).await
    }

    async fn erase(&self, query: &SearchQuery) -> Result<Vec<DownloadId>, EngineError> {
        self.log(EngineCall::Erase(query.clone()));
        self.inner.erase(query).await
    }

    async fn file_icon(&self, id: DownloadId, size: u32) -> Result<Option<String>, EngineError> {
        self.log(EngineCall::FileIcon(id, size));
        self.inner.file_icon(id, size).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeInfo> {
        self.inner.subscribe()
    }
}

/// Page double with a fixed selection and a fixed answer to confirmations.
#[derive(Debug, Default)]
pub struct ScriptedPage {
    pub selection: Option<SelectionSnapshot>,
    pub accept: bool,
    pub prompts: Mutex<Vec<String>>,
    pub alerts: Mutex<Vec<String>>,
}

impl ScriptedPage {
    pub fn with_selection(markup: &str, anchors: &[&str], accept: bool) -> Self {
        Self {
            selection: Some(SelectionSnapshot {
                markup: markup.to_string(),
                anchors: anchors.iter().map(ToString::to_string).collect(),
            }),
            accept,
            ..Self::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActivePage for ScriptedPage {
    async fn capture_selection(&self) -> Option<SelectionSnapshot> {
        self.selection.clone()
    }

    async fn confirm(&self, message: &str) -> bool {
        self.prompts.lock().unwrap().push(message.to_string());
        self.accept
    }

    async fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

pub fn record(id: u64, state: DownloadState) -> DownloadRecord {
    DownloadRecord {
        id: DownloadId(id),
        url: format!("https://a.test/{id}.bin"),
        state,
        bytes_received: 0,
        total_bytes: 0,
        paused: false,
        filename: Some(format!("{id}.bin")),
        native: false,
    }
}

pub fn in_progress(id: u64, received: u64, total: u64, paused: bool) -> DownloadRecord {
    DownloadRecord {
        bytes_received: received,
        total_bytes: total,
        paused,
        ..record(id, DownloadState::InProgress)
    }
}

/// Every broadcast already queued on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<Broadcast>) -> Vec<Broadcast> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
