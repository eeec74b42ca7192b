//! The host surface: everything the orchestrator shows or asks of the
//! environment it runs in, outside the engine.
//!
//! - [`Host`] - badge, native reveal/open, notifications, context menus
//! - [`Notifier`] - notification helper with the fixed icon and app title
//! - [`ConsoleHost`] - logs every host call; used by the stdio binary
//! - [`RecordingHost`] - keeps every host call in memory for inspection

mod console;
mod notify;
mod recording;

pub use console::ConsoleHost;
pub use notify::{NOTIFICATION_ICON, Notification, Notifier};
pub use recording::{HostCall, RecordingHost};

use crate::engine::DownloadId;
use crate::menu::MenuEntry;

/// Host-side effects the orchestrator triggers.
///
/// All calls are fire-and-forget.
pub trait Host: Send + Sync {
    /// Display name of the running application.
    fn app_name(&self) -> &str;

    /// Sets the aggregate progress badge. An empty string clears it.
    fn set_badge_text(&self, text: &str);

    /// Reveals a finished download in the host's file manager.
    fn show_download(&self, id: DownloadId);

    /// Opens a finished download with its default handler.
    fn open_download(&self, id: DownloadId);

    /// Shows a user-visible notification.
    fn show_notification(&self, notification: &Notification);

    /// Registers one context menu entry.
    fn create_context_menu(&self, entry: &MenuEntry);
}
