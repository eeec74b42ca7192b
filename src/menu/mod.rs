//! Context menu surface: the registered entries and click dispatch.

mod dispatch;
mod selection;

pub use dispatch::{
    CONFIRM_HEADER, EXTRACT_THREADS, MenuDispatcher, MenuOutcome, NO_SELECTION_LINK_MESSAGE,
};
pub use selection::{ActivePage, SelectionSnapshot};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::host::Host;

/// One context menu entry as registered with the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    /// Identifier reported back in [`ClickInfo::menu_item_id`].
    pub id: &'static str,
    /// Label shown to the user.
    pub title: &'static str,
    /// Page contexts the entry appears in.
    pub contexts: &'static [&'static str],
}

/// Entries registered on every startup and install.
pub const MENU_ENTRIES: [MenuEntry; 4] = [
    MenuEntry {
        id: "extract-links",
        title: "Extract Links",
        contexts: &["selection"],
    },
    MenuEntry {
        id: "download-link",
        title: "Download Link",
        contexts: &["link"],
    },
    MenuEntry {
        id: "download-image",
        title: "Download Image",
        contexts: &["image"],
    },
    MenuEntry {
        id: "download-media",
        title: "Download Media",
        contexts: &["audio", "video"],
    },
];

/// Registers every entry of [`MENU_ENTRIES`] with `host`.
pub fn register_context_menus(host: &dyn Host) {
    for entry in &MENU_ENTRIES {
        host.create_context_menu(entry);
    }
    debug!(count = MENU_ENTRIES.len(), "context menus registered");
}

/// A recognised menu command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    /// Collect links from the page selection.
    ExtractLinks,
    /// Download the clicked link target.
    DownloadLink,
    /// Download the clicked image.
    DownloadImage,
    /// Download the clicked audio or video source.
    DownloadMedia,
    /// Download the document of the clicked frame.
    DownloadFrame,
}

impl MenuCommand {
    /// Menu item id of the command.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExtractLinks => "extract-links",
            Self::DownloadLink => "download-link",
            Self::DownloadImage => "download-image",
            Self::DownloadMedia => "download-media",
            Self::DownloadFrame => "download-frame",
        }
    }
}

impl fmt::Display for MenuCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MenuCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extract-links" => Ok(Self::ExtractLinks),
            "download-link" => Ok(Self::DownloadLink),
            "download-image" => Ok(Self::DownloadImage),
            "download-media" => Ok(Self::DownloadMedia),
            "download-frame" => Ok(Self::DownloadFrame),
            other => Err(format!("unknown menu item: {other}")),
        }
    }
}

/// What the host reports about a menu click.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickInfo {
    /// Id of the clicked entry.
    pub menu_item_id: String,
    /// Target of the clicked link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_url: Option<String>,
    /// Source of the clicked image or media element.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_url: Option<String>,
    /// Document URL of the clicked frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_url: Option<String>,
}

impl ClickInfo {
    /// URL a direct download command acts on.
    #[must_use]
    pub fn target_url(&self, command: MenuCommand) -> Option<&str> {
        let url = match command {
            MenuCommand::ExtractLinks => return None,
            MenuCommand::DownloadLink => &self.link_url,
            MenuCommand::DownloadImage | MenuCommand::DownloadMedia => &self.src_url,
            MenuCommand::DownloadFrame => &self.frame_url,
        };
        url.as_deref().filter(|url| !url.is_empty())
    }
}
