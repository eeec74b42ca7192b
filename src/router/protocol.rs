//! Wire types of the UI request protocol.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

use crate::engine::{DownloadId, DownloadRecord, SearchQuery};

/// Icon size used when a `get-icon` request names none.
pub const DEFAULT_ICON_SIZE: u32 = 32;

fn default_icon_size() -> u32 {
    DEFAULT_ICON_SIZE
}

/// A UI-originated request, tagged by its `method` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum Request {
    /// A UI instance opened and wants the settled picture.
    #[serde(rename = "popup_ready")]
    PopupReady,
    /// Engine query passed through verbatim.
    #[serde(rename = "search")]
    Search { query: SearchQuery },
    /// Forget every matching record.
    #[serde(rename = "erase")]
    Erase { query: SearchQuery },
    #[serde(rename = "cancel")]
    Cancel { id: DownloadId },
    #[serde(rename = "resume")]
    Resume { id: DownloadId },
    #[serde(rename = "pause")]
    Pause { id: DownloadId },
    /// Reveal the file in the host's file manager.
    #[serde(rename = "show")]
    Show { id: DownloadId },
    /// Open the file with its default handler.
    #[serde(rename = "open")]
    Open { id: DownloadId },
    #[serde(rename = "get-icon")]
    GetIcon {
        id: DownloadId,
        #[serde(default = "default_icon_size")]
        size: u32,
    },
    /// Comma-separated links, each optionally prefixed with `<threads>|`.
    #[serde(rename = "add-new")]
    AddNew { value: String },
    #[serde(rename = "extract-links")]
    ExtractLinks { content: String },
}

impl Request {
    /// Wire name of the method.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::PopupReady => "popup_ready",
            Self::Search { .. } => "search",
            Self::Erase { .. } => "erase",
            Self::Cancel { .. } => "cancel",
            Self::Resume { .. } => "resume",
            Self::Pause { .. } => "pause",
            Self::Show { .. } => "show",
            Self::Open { .. } => "open",
            Self::GetIcon { .. } => "get-icon",
            Self::AddNew { .. } => "add-new",
            Self::ExtractLinks { .. } => "extract-links",
        }
    }

    /// Whether the caller should wait for a [`Reply`].
    ///
    /// `show`, `open`, and `add-new` are fire-and-forget.
    #[must_use]
    pub fn expects_reply(&self) -> bool {
        !matches!(
            self,
            Self::Show { .. } | Self::Open { .. } | Self::AddNew { .. }
        )
    }
}

/// Reply payload. Serialized bare, without a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reply {
    /// `popup_ready`, `search`
    Records(Vec<DownloadRecord>),
    /// `cancel`, `resume`, `pause`; `None` once the engine forgot the record
    Record(Option<DownloadRecord>),
    /// `erase`
    Erased(Vec<DownloadId>),
    /// `get-icon`
    Icon(Option<String>),
    /// `extract-links`
    Links(Vec<String>),
}

/// Where a reply goes: a one-shot channel or a callback run in place.
pub struct Responder(Sink);

enum Sink {
    Channel(oneshot::Sender<Reply>),
    Callback(Box<dyn FnOnce(Reply) + Send>),
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.0 {
            Sink::Channel(_) => "channel",
            Sink::Callback(_) => "callback",
        };
        f.debug_tuple("Responder").field(&kind).finish()
    }
}

impl Responder {
    /// Creates a responder and the receiver its reply arrives on.
    #[must_use]
    pub fn channel() -> (Self, oneshot::Receiver<Reply>) {
        let (sender, receiver) = oneshot::channel();
        (Self(Sink::Channel(sender)), receiver)
    }

    /// Responder that hands the reply to `callback` as soon as it is ready,
    /// before any follow-up work of the request runs.
    pub fn from_fn(callback: impl FnOnce(Reply) + Send + 'static) -> Self {
        Self(Sink::Callback(Box::new(callback)))
    }

    /// Delivers the reply. A caller that stopped waiting is not an error.
    pub fn send(self, reply: Reply) {
        match self.0 {
            Sink::Channel(sender) => {
                if sender.send(reply).is_err() {
                    debug!("requester went away before the reply");
                }
            }
            Sink::Callback(callback) => callback(reply),
        }
    }
}
