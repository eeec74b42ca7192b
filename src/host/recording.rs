//! Host that records every call.

use std::sync::{Mutex, PoisonError};

use super::{Host, Notification};
use crate::engine::DownloadId;
use crate::menu::MenuEntry;

/// One call made on a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// `set_badge_text`
    Badge(String),
    /// `show_download`
    Show(DownloadId),
    /// `open_download`
    Open(DownloadId),
    /// `show_notification`
    Notification(Notification),
    /// `create_context_menu`, by entry id
    ContextMenu(String),
}

/// Host that keeps every call in order, for embedding in headless setups
/// and for inspecting orchestrator behaviour.
#[derive(Debug)]
pub struct RecordingHost {
    app_name: String,
    calls: Mutex<Vec<HostCall>>,
}

impl RecordingHost {
    /// Creates a host reporting `app_name`.
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// All calls so far.
    #[must_use]
    pub fn calls(&self) -> Vec<HostCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The most recent badge text, if the badge was ever set.
    #[must_use]
    pub fn badge(&self) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            HostCall::Badge(text) => Some(text),
            _ => None,
        })
    }

    /// Notifications shown so far.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    /// Ids of registered context menu entries, in registration order.
    #[must_use]
    pub fn context_menus(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::ContextMenu(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Host for RecordingHost {
    fn app_name(&self) -> &str {
        &self.app_name
    }

    fn set_badge_text(&self, text: &str) {
        self.record(HostCall::Badge(text.to_string()));
    }

    fn show_download(&self, id: DownloadId) {
        self.record(HostCall::Show(id));
    }

    fn open_download(&self, id: DownloadId) {
        self.record(HostCall::Open(id));
    }

    fn show_notification(&self, notification: &Notification) {
        self.record(HostCall::Notification(notification.clone()));
    }

    fn create_context_menu(&self, entry: &MenuEntry) {
        self.record(HostCall::ContextMenu(entry.id.to_string()));
    }
}
