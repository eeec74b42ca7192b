//! Engine change notifications feeding the update loop.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use super::UpdateLoop;
use crate::engine::{ChangeInfo, SearchQuery};
use crate::ui::Broadcast;

impl UpdateLoop {
    /// Reconciles one change notification.
    ///
    /// A hand-off to native handling is relayed as `convert-to-native` and
    /// nothing else happens. Any other change runs one poll cycle; then a
    /// move into a settled state (complete, interrupted, transfer) pushes the
    /// record as `batch-update`, or a newly known filename pushes it as
    /// `prepare-one`.
    #[instrument(skip(self, info), fields(id = %info.id))]
    pub async fn handle_change(self: &Arc<Self>, info: ChangeInfo) {
        if info.native {
            debug!("relaying native hand-off");
            self.ui.publish(Broadcast::ConvertToNative(info));
            return;
        }

        self.perform().await;

        let settled = info
            .state
            .as_ref()
            .is_some_and(|state| state.current.is_settled());
        if !settled && info.filename.is_none() {
            return;
        }

        let records = match self.engine.search(&SearchQuery::by_id(info.id)).await {
            Ok(records) => records,
            Err(error) => {
                warn!(error = %error, "record query after change failed");
                return;
            }
        };

        if settled {
            self.ui.publish(Broadcast::BatchUpdate { ds: records });
        } else if let Some(d) = records.into_iter().next() {
            self.ui.publish(Broadcast::PrepareOne { d });
        } else {
            debug!("record gone before filename could be shown");
        }
    }

    /// Spawns the task that feeds the engine's change stream into
    /// [`handle_change`](Self::handle_change).
    ///
    /// A lagging subscription runs one poll cycle to catch up. The task ends
    /// when the engine closes its stream.
    pub fn spawn_change_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut changes = self.engine.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(info) => this.handle_change(info).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change listener lagged; resynchronising");
                        this.perform().await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("engine change stream closed");
                        break;
                    }
                }
            }
        })
    }
}
