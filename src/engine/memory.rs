//! In-memory engine that tracks records without moving bytes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, instrument, trace};
use url::Url;

use super::{
    ChangeInfo, Delta, DownloadEngine, DownloadId, DownloadOptions, DownloadRecord, DownloadState,
    EngineError, SearchQuery,
};
use crate::config::ConfigurationProfile;

/// Capacity of the change notification channel.
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// A `download()` call as the engine received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Id issued for the transfer.
    pub id: DownloadId,
    /// Options passed by the caller.
    pub options: DownloadOptions,
    /// Profile the transfer was started with.
    pub profile: ConfigurationProfile,
}

/// Engine keeping records in memory.
///
/// Commands update records and publish the matching [`ChangeInfo`]. Progress,
/// completion, and native hand-off are driven from outside through
/// [`report_progress`](Self::report_progress), [`complete`](Self::complete),
/// and [`hand_off_to_native`](Self::hand_off_to_native).
#[derive(Debug)]
pub struct MemoryEngine {
    records: Mutex<BTreeMap<DownloadId, DownloadRecord>>,
    submissions: Mutex<Vec<Submission>>,
    next_id: AtomicU64,
    changes: broadcast::Sender<ChangeInfo>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEngine {
    /// Creates an empty engine. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            records: Mutex::new(BTreeMap::new()),
            submissions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            changes,
        }
    }

    /// Every `download()` call received so far, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<Submission> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Inserts a record as-is without publishing a change.
    pub fn insert(&self, record: DownloadRecord) {
        let id = record.id;
        self.next_id.fetch_max(id.0 + 1, Ordering::SeqCst);
        self.records().insert(id, record);
    }

    /// Updates byte counters of an in-progress transfer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the id is unknown or the counters break
    /// `bytes_received <= total_bytes`.
    pub fn report_progress(
        &self,
        id: DownloadId,
        bytes_received: u64,
        total_bytes: u64,
    ) -> Result<(), EngineError> {
        if total_bytes > 0 && bytes_received > total_bytes {
            return Err(EngineError::invalid_transition(
                id,
                "report progress for",
                format!("{bytes_received} bytes received exceeds total {total_bytes}"),
            ));
        }
        self.mutate(id, |record| {
            record.bytes_received = bytes_received;
            record.total_bytes = total_bytes;
            let mut change = ChangeInfo::for_id(id);
            change.bytes_received = Some(bytes_received);
            change.total_bytes = Some(total_bytes);
            Ok(change)
        })
    }

    /// Records the destination file name.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id.
    pub fn set_filename(&self, id: DownloadId, filename: &str) -> Result<(), EngineError> {
        self.mutate(id, |record| {
            let previous = record.filename.replace(filename.to_string());
            let mut change = ChangeInfo::for_id(id);
            change.filename = Some(Delta::new(previous, filename.to_string()));
            Ok(change)
        })
    }

    /// Marks a transfer complete.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] for an unknown id or a transfer that already
    /// settled.
    pub fn complete(&self, id: DownloadId) -> Result<(), EngineError> {
        self.mutate(id, |record| {
            if record.state.is_settled() {
                return Err(EngineError::invalid_transition(
                    id,
                    "complete",
                    format!("transfer is {}", record.state),
                ));
            }
            if record.total_bytes > 0 {
                record.bytes_received = record.total_bytes;
            }
            record.paused = false;
            Ok(transition(record, DownloadState::Complete))
        })
    }

    /// Hands a transfer over to the host's own download handling.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id.
    pub fn hand_off_to_native(&self, id: DownloadId) -> Result<(), EngineError> {
        self.mutate(id, |record| {
            record.native = true;
            let mut change = transition(record, DownloadState::Transfer);
            change.native = true;
            Ok(change)
        })
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<DownloadId, DownloadRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` to one record under the lock, then publishes its change.
    fn mutate<F>(&self, id: DownloadId, f: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut DownloadRecord) -> Result<ChangeInfo, EngineError>,
    {
        let change = {
            let mut records = self.records();
            let record = records
                .get_mut(&id)
                .ok_or_else(|| EngineError::not_found(id))?;
            f(record)?
        };
        self.publish(change);
        Ok(())
    }

    fn publish(&self, change: ChangeInfo) {
        trace!(id = %change.id, "publishing change");
        if self.changes.send(change).is_err() {
            trace!("no change subscribers");
        }
    }
}

/// Moves `record` to `next` and describes the move.
fn transition(record: &mut DownloadRecord, next: DownloadState) -> ChangeInfo {
    let previous = std::mem::replace(&mut record.state, next);
    let mut change = ChangeInfo::for_id(record.id);
    change.state = Some(Delta::new(Some(previous), next));
    change
}

fn filename_from_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(ToString::to_string)
}

#[async_trait]
impl DownloadEngine for MemoryEngine {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<DownloadRecord>, EngineError> {
        Ok(self
            .records()
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    #[instrument(skip(self, profile), fields(url = %options.url, threads = profile.max_number_of_threads))]
    async fn download(
        &self,
        options: DownloadOptions,
        profile: &ConfigurationProfile,
    ) -> Result<DownloadId, EngineError> {
        let id = DownloadId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let filename = filename_from_url(&options.url);
        let mut record = DownloadRecord {
            id,
            url: options.url.clone(),
            state: DownloadState::Queued,
            bytes_received: 0,
            total_bytes: 0,
            paused: false,
            filename: None,
            native: false,
        };
        let started = transition(&mut record, DownloadState::InProgress);
        self.records().insert(id, record);
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Submission {
                id,
                options,
                profile: profile.clone(),
            });
        debug!(%id, "transfer accepted");
        self.publish(started);

        if let Some(name) = filename {
            self.set_filename(id, &name)?;
        }
        Ok(id)
    }

    async fn cancel(&self, id: DownloadId) -> Result<(), EngineError> {
        self.mutate(id, |record| {
            if matches!(
                record.state,
                DownloadState::Complete | DownloadState::Interrupted
            ) {
                return Err(EngineError::invalid_transition(
                    id,
                    "cancel",
                    format!("transfer is {}", record.state),
                ));
            }
            record.paused = false;
            Ok(transition(record, DownloadState::Interrupted))
        })
    }

    async fn resume(&self, id: DownloadId) -> Result<(), EngineError> {
        self.mutate(id, |record| match record.state {
            DownloadState::InProgress | DownloadState::Paused if record.paused => {
                record.paused = false;
                let mut change = if record.state == DownloadState::Paused {
                    transition(record, DownloadState::InProgress)
                } else {
                    ChangeInfo::for_id(id)
                };
                change.paused = Some(Delta::new(Some(true), false));
                Ok(change)
            }
            DownloadState::Interrupted => {
                record.paused = false;
                Ok(transition(record, DownloadState::InProgress))
            }
            state => Err(EngineError::invalid_transition(
                id,
                "resume",
                format!("transfer is {state}"),
            )),
        })
    }

    async fn pause(&self, id: DownloadId) -> Result<(), EngineError> {
        self.mutate(id, |record| {
            if record.state != DownloadState::InProgress || record.paused {
                return Err(EngineError::invalid_transition(
                    id,
                    "pause",
                    format!("transfer is {}", record.state),
                ));
            }
            record.paused = true;
            let mut change = ChangeInfo::for_id(id);
            change.paused = Some(Delta::new(Some(false), true));
            Ok(change)
        })
    }

    async fn erase(&self, query: &SearchQuery) -> Result<Vec<DownloadId>, EngineError> {
        let mut records = self.records();
        let erased: Vec<DownloadId> = records
            .values()
            .filter(|record| query.matches(record))
            .map(|record| record.id)
            .collect();
        for id in &erased {
            records.remove(id);
        }
        debug!(count = erased.len(), "erased records");
        Ok(erased)
    }

    async fn file_icon(&self, id: DownloadId, size: u32) -> Result<Option<String>, EngineError> {
        let records = self.records();
        let record = records
            .get(&id)
            .ok_or_else(|| EngineError::not_found(id))?;
        Ok(record
            .filename
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| format!("moz-icon://.{ext}?size={size}")))
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeInfo> {
        self.changes.subscribe()
    }
}
