//! User-visible notifications.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::Host;

/// Icon shown with every notification.
pub const NOTIFICATION_ICON: &str = "/data/icons/48.png";

/// A basic host notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Icon path.
    pub icon_url: String,
    /// Title line, the application name.
    pub title: String,
    /// Body text.
    pub message: String,
}

/// Surfaces errors and plain messages as host notifications.
#[derive(Clone)]
pub struct Notifier {
    host: Arc<dyn Host>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("app_name", &self.host.app_name())
            .finish()
    }
}

impl Notifier {
    /// Creates a notifier posting through `host`.
    #[must_use]
    pub fn new(host: Arc<dyn Host>) -> Self {
        Self { host }
    }

    /// Shows `message` (an error or any displayable text).
    pub fn notify(&self, message: impl fmt::Display) {
        let notification = Notification {
            icon_url: NOTIFICATION_ICON.to_string(),
            title: self.host.app_name().to_string(),
            message: message.to_string(),
        };
        info!(message = %notification.message, "notifying user");
        self.host.show_notification(&notification);
    }
}
