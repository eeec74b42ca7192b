//! Host that reports every call through `tracing`.

use tracing::{debug, info, warn};

use super::{Host, Notification};
use crate::engine::DownloadId;
use crate::menu::MenuEntry;

/// Host for headless runs: badge changes, reveal/open requests, and
/// notifications become log events.
#[derive(Debug, Clone)]
pub struct ConsoleHost {
    app_name: String,
}

impl ConsoleHost {
    /// Creates a console host reporting `app_name`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Host for ConsoleHost {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn set_badge_text(&self, text: &str) {
        debug!(badge = text, "badge updated");
    }

    fn show_download(&self, id: DownloadId) {
        info!(%id, "reveal requested");
    }

    fn open_download(&self, id: DownloadId) {
        info!(%id, "open requested");
    }

    fn show_notification(&self, notification: &Notification) {
        warn!(title = %notification.title, "{}", notification.message);
    }

    fn create_context_menu(&self, entry: &MenuEntry) {
        debug!(id = entry.id, title = entry.title, "context menu registered");
    }
}
