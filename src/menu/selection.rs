//! Access to the page a menu command was invoked on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Serialized contents of the page's current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// Markup of every selected range, concatenated.
    #[serde(default)]
    pub markup: String,
    /// Resolved `href` of every anchor inside the selection, in document
    /// order.
    #[serde(default)]
    pub anchors: Vec<String>,
}

/// The active page, as seen by the menu dispatcher.
#[async_trait]
pub trait ActivePage: Send + Sync {
    /// Captures the current selection. `None` when the page has none or
    /// cannot be scripted.
    async fn capture_selection(&self) -> Option<SelectionSnapshot>;

    /// Asks the user to confirm `message`.
    async fn confirm(&self, message: &str) -> bool;

    /// Shows `message` to the user.
    async fn alert(&self, message: &str);
}
