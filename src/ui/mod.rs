//! Push channel from the orchestrator to every listening UI instance.
//!
//! Broadcasts need no request: each open popup subscribes and receives every
//! event published after it subscribed.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

use crate::engine::{ChangeInfo, DownloadRecord};

/// Default channel capacity for UI broadcasts.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Events pushed to UI instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum Broadcast {
    /// Point-in-time snapshot of a set of records.
    BatchUpdate {
        /// The records.
        ds: Vec<DownloadRecord>,
    },
    /// A transfer now has a destination worth displaying.
    PrepareOne {
        /// The record.
        d: DownloadRecord,
    },
    /// The engine gave a transfer to native handling; the change is relayed
    /// untouched.
    ConvertToNative(ChangeInfo),
}

impl Broadcast {
    /// Wire tag of the event.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::BatchUpdate { .. } => "batch-update",
            Self::PrepareOne { .. } => "prepare-one",
            Self::ConvertToNative(_) => "convert-to-native",
        }
    }
}

/// Fan-out sender for [`Broadcast`] events.
#[derive(Debug, Clone)]
pub struct UiChannel {
    sender: broadcast::Sender<Broadcast>,
}

impl Default for UiChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl UiChannel {
    /// Creates a channel with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a channel with the given capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes a UI instance.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.sender.subscribe()
    }

    /// Publishes an event to every subscriber.
    ///
    /// Returns the number of receivers; 0 when no UI is listening.
    pub fn publish(&self, event: Broadcast) -> usize {
        trace!(method = event.method(), "broadcasting");
        // send() returns Err if there are no receivers, which is fine
        self.sender.send(event).unwrap_or(0)
    }

    /// Number of listening UI instances.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::{DownloadId, DownloadState};

    fn record() -> DownloadRecord {
        DownloadRecord {
            id: DownloadId(1),
            url: "https://a.test/x.zip".to_string(),
            state: DownloadState::InProgress,
            bytes_received: 10,
            total_bytes: 20,
            paused: false,
            filename: Some("x.zip".to_string()),
            native: false,
        }
    }

    #[test]
    fn test_batch_update_wire_form() {
        let json = serde_json::to_value(Broadcast::BatchUpdate { ds: vec![record()] }).unwrap();
        assert_eq!(json["method"], "batch-update");
        assert_eq!(json["ds"][0]["bytesReceived"], 10);
    }

    #[test]
    fn test_prepare_one_wire_form() {
        let json = serde_json::to_value(Broadcast::PrepareOne { d: record() }).unwrap();
        assert_eq!(json["method"], "prepare-one");
        assert_eq!(json["d"]["filename"], "x.zip");
    }

    #[test]
    fn test_convert_to_native_inlines_change_fields() {
        let mut info = ChangeInfo::for_id(DownloadId(4));
        info.native = true;
        let json = serde_json::to_value(Broadcast::ConvertToNative(info)).unwrap();
        assert_eq!(json["method"], "convert-to-native");
        assert_eq!(json["id"], 4);
        assert_eq!(json["native"], true);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber() {
        let channel = UiChannel::new();
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        let delivered = channel.publish(Broadcast::BatchUpdate { ds: Vec::new() });
        assert_eq!(delivered, 2);
        assert_eq!(first.recv().await.unwrap().method(), "batch-update");
        assert_eq!(second.recv().await.unwrap().method(), "batch-update");
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = UiChannel::new();
        assert_eq!(channel.publish(Broadcast::BatchUpdate { ds: Vec::new() }), 0);
    }
}
