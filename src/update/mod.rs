//! Progress aggregation: the poll loop behind the badge and `batch-update`.
//!
//! Two triggers feed one reconciliation, [`UpdateLoop::perform`]:
//!
//! - **pull**: while any in-progress transfer is not paused, `perform` re-arms
//!   a timer that calls it again after the poll interval;
//! - **push**: every engine change notification runs `perform` once (see
//!   [`UpdateLoop::handle_change`]).
//!
//! The loop stops polling as soon as nothing is actively transferring and
//! starts again only when one of the triggers fires.

mod changes;
mod timer;

use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tracing::{debug, instrument, warn};

use crate::engine::{DownloadEngine, DownloadRecord, DownloadState, SearchQuery};
use crate::host::Host;
use crate::ui::{Broadcast, UiChannel};
use timer::PollTimer;

/// Default delay between polls while transfers are active.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Polling state machine owning the single poll timer.
pub struct UpdateLoop {
    engine: Arc<dyn DownloadEngine>,
    host: Arc<dyn Host>,
    ui: UiChannel,
    interval: Duration,
    timer: PollTimer,
}

impl std::fmt::Debug for UpdateLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateLoop")
            .field("interval", &self.interval)
            .field("armed", &self.timer.is_armed())
            .finish_non_exhaustive()
    }
}

impl UpdateLoop {
    /// Creates an idle loop.
    #[must_use]
    pub fn new(
        engine: Arc<dyn DownloadEngine>,
        host: Arc<dyn Host>,
        ui: UiChannel,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            host,
            ui,
            interval,
            timer: PollTimer::default(),
        })
    }

    /// Runs one poll cycle.
    ///
    /// Disarms any pending timer, queries the in-progress set, re-arms if a
    /// transfer is actively moving, updates the badge, and broadcasts the set
    /// as `batch-update` (even when empty).
    ///
    /// If the engine query fails the cycle is dropped: nothing is broadcast,
    /// the badge keeps its text, and no timer is armed.
    #[instrument(skip(self))]
    pub async fn perform(self: &Arc<Self>) {
        self.timer.disarm();

        let records = match self
            .engine
            .search(&SearchQuery::by_state(DownloadState::InProgress))
            .await
        {
            Ok(records) => records,
            Err(error) => {
                warn!(error = %error, "in-progress query failed; skipping poll cycle");
                return;
            }
        };

        if records.iter().any(|record| !record.paused) {
            self.arm();
        }

        let badge = badge_text(&records);
        debug!(in_progress = records.len(), badge = %badge, "poll cycle");
        self.host.set_badge_text(&badge);
        self.ui.publish(Broadcast::BatchUpdate { ds: records });
    }

    /// Whether a poll is scheduled.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.timer.is_armed()
    }

    /// Cancels the scheduled poll, if any.
    pub fn disarm(&self) {
        self.timer.disarm();
    }

    /// Poll interval in use.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn arm(self: &Arc<Self>) {
        let this = Arc::downgrade(self);
        let interval = self.interval;
        self.timer.arm(|generation| {
            tokio::spawn(async move {
                tokio::time::sleep(interval).await;
                if let Some(this) = this.upgrade() {
                    this.fire(generation).await;
                }
            })
        });
    }

    /// Timer body; boxed because it re-enters `perform`.
    fn fire(self: Arc<Self>, generation: u64) -> BoxFuture<'static, ()> {
        async move {
            if self.timer.claim(generation) {
                self.perform().await;
            }
        }
        .boxed()
    }
}

/// Badge text for an in-progress set: the rounded percentage of summed
/// bytes followed by `%`, or empty when the set is empty or no total is
/// known.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn badge_text(records: &[DownloadRecord]) -> String {
    let received = records
        .iter()
        .map(|r| r.bytes_received)
        .fold(0, u64::saturating_add);
    let total = records
        .iter()
        .map(|r| r.total_bytes)
        .fold(0, u64::saturating_add);
    if total == 0 {
        return String::new();
    }
    let percent = (received as f64 / total as f64 * 100.0).round() as u64;
    format!("{percent}%")
}
