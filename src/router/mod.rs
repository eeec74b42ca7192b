//! Message router: the single entry point for UI-originated commands.
//!
//! Requests arrive as [`Request`] values (or their JSON wire form) and are
//! matched exhaustively. Reply-bearing methods always answer, even when the
//! engine call fails: the failure is logged and the reply carries whatever
//! the engine can still report (an empty list, or `null` for a single
//! record).

mod protocol;

pub use protocol::{DEFAULT_ICON_SIZE, Reply, Request, Responder};

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, instrument, warn};

use crate::config::ConfigurationProfile;
use crate::engine::{
    DownloadEngine, DownloadId, DownloadOptions, DownloadRecord, DownloadState, EngineError,
    SearchQuery,
};
use crate::host::{Host, Notifier};
use crate::links::{extract_links, parse_link_list};
use crate::update::UpdateLoop;

/// Notification shown when `add-new` has nothing to submit.
pub const NO_LINK_MESSAGE: &str = "There is no link to download";

/// States a freshly opened UI needs to see, in reply order.
const SETTLED_STATES: [DownloadState; 3] = [
    DownloadState::Transfer,
    DownloadState::Interrupted,
    DownloadState::Complete,
];

/// Dispatches requests to the engine, the host, and the link utilities.
pub struct Router {
    engine: Arc<dyn DownloadEngine>,
    host: Arc<dyn Host>,
    update: Arc<UpdateLoop>,
    profile: ConfigurationProfile,
    notifier: Notifier,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("profile", &self.profile)
            .field("update", &self.update)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Creates a router submitting new downloads under `profile`.
    #[must_use]
    pub fn new(
        engine: Arc<dyn DownloadEngine>,
        host: Arc<dyn Host>,
        update: Arc<UpdateLoop>,
        profile: ConfigurationProfile,
    ) -> Arc<Self> {
        let notifier = Notifier::new(Arc::clone(&host));
        Arc::new(Self {
            engine,
            host,
            update,
            profile,
            notifier,
        })
    }

    /// Process-wide default profile.
    #[must_use]
    pub fn profile(&self) -> &ConfigurationProfile {
        &self.profile
    }

    /// Handles `request` to completion and returns its reply, if the method
    /// has one.
    ///
    /// The reply is returned only after any follow-up work, so a
    /// `popup_ready` poll has already broadcast by then. Use
    /// [`handle_with`](Self::handle_with) to see the reply first.
    pub async fn handle(&self, request: Request) -> Option<Reply> {
        if !request.expects_reply() {
            self.process(request, None).await;
            return None;
        }
        let (responder, receiver) = Responder::channel();
        self.process(request, Some(responder)).await;
        receiver.await.ok()
    }

    /// Handles `request` to completion, delivering its reply through
    /// `responder` the moment it is ready. Methods without a reply drop the
    /// responder unused.
    pub async fn handle_with(&self, request: Request, responder: Responder) {
        let responder = request.expects_reply().then_some(responder);
        self.process(request, responder).await;
    }

    /// Spawns the handling of `request`.
    ///
    /// `Some` means a reply is pending on the returned receiver.
    pub fn dispatch(self: &Arc<Self>, request: Request) -> Option<oneshot::Receiver<Reply>> {
        let (responder, receiver) = if request.expects_reply() {
            let (responder, receiver) = Responder::channel();
            (Some(responder), Some(receiver))
        } else {
            (None, None)
        };
        let router = Arc::clone(self);
        tokio::spawn(async move { router.process(request, responder).await });
        receiver
    }

    /// Parses a JSON request and dispatches it. Malformed input and unknown
    /// methods are dropped without a reply.
    pub fn dispatch_json(self: &Arc<Self>, raw: &str) -> Option<oneshot::Receiver<Reply>> {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.dispatch(request),
            Err(error) => {
                debug!(error = %error, "ignoring malformed request");
                None
            }
        }
    }

    /// Runs one request. Reply-bearing requests come with a responder and
    /// are answered exactly once.
    #[instrument(skip_all, fields(method = request.method()))]
    async fn process(&self, request: Request, responder: Option<Responder>) {
        let reply = match request {
            Request::PopupReady => {
                let records = self.settled_records().await;
                respond(responder, Reply::Records(records));
                self.update.perform().await;
                return;
            }
            Request::Search { query } => Reply::Records(self.search(&query).await),
            Request::Erase { query } => Reply::Erased(
                self.engine
                    .erase(&query)
                    .await
                    .unwrap_or_else(|error| log_failure("erase", &error)),
            ),
            Request::Cancel { id } => {
                let outcome = self.engine.cancel(id).await;
                Reply::Record(self.after_command(id, "cancel", outcome).await)
            }
            Request::Resume { id } => {
                let outcome = self.engine.resume(id).await;
                Reply::Record(self.after_command(id, "resume", outcome).await)
            }
            Request::Pause { id } => {
                let outcome = self.engine.pause(id).await;
                Reply::Record(self.after_command(id, "pause", outcome).await)
            }
            Request::Show { id } => {
                self.host.show_download(id);
                return;
            }
            Request::Open { id } => {
                self.host.open_download(id);
                return;
            }
            Request::GetIcon { id, size } => Reply::Icon(
                self.engine
                    .file_icon(id, size)
                    .await
                    .unwrap_or_else(|error| log_failure("get-icon", &error)),
            ),
            Request::AddNew { value } => {
                self.add_new(&value).await;
                return;
            }
            Request::ExtractLinks { content } => Reply::Links(extract_links(&content)),
        };
        respond(responder, reply);
    }

    /// Transfer, interrupted, and complete records, queried concurrently and
    /// concatenated in that order.
    async fn settled_records(&self) -> Vec<DownloadRecord> {
        let [transfer, interrupted, complete] = SETTLED_STATES.map(SearchQuery::by_state);
        let (transfer, interrupted, complete) = futures_util::future::join3(
            self.search(&transfer),
            self.search(&interrupted),
            self.search(&complete),
        )
        .await;
        let mut records = transfer;
        records.extend(interrupted);
        records.extend(complete);
        records
    }

    async fn search(&self, query: &SearchQuery) -> Vec<DownloadRecord> {
        self.engine
            .search(query)
            .await
            .unwrap_or_else(|error| log_failure("search", &error))
    }

    /// Re-reads a record after a command so the caller sees post-command
    /// state.
    async fn after_command(
        &self,
        id: DownloadId,
        action: &'static str,
        outcome: Result<(), EngineError>,
    ) -> Option<DownloadRecord> {
        if let Err(error) = outcome {
            warn!(%id, action, error = %error, "engine refused command");
        }
        self.search(&SearchQuery::by_id(id)).await.into_iter().next()
    }

    /// Submits one download per distinct entry of an `add-new` value.
    async fn add_new(&self, value: &str) {
        let requests = parse_link_list(value);
        if requests.is_empty() {
            self.notifier.notify(NO_LINK_MESSAGE);
            return;
        }
        info!(count = requests.len(), "submitting links");
        for request in requests {
            let profile = self.profile.with_thread_override(request.thread_count());
            if let Err(error) = self
                .engine
                .download(DownloadOptions::new(request.url.as_str()), &profile)
                .await
            {
                warn!(url = %request.url, error = %error, "engine rejected download");
            }
        }
    }
}

fn respond(responder: Option<Responder>, reply: Reply) {
    match responder {
        Some(responder) => responder.send(reply),
        None => debug!("reply dropped: request was not expecting one"),
    }
}

fn log_failure<T: Default>(action: &'static str, error: &EngineError) -> T {
    warn!(action, error = %error, "engine call failed");
    T::default()
}
