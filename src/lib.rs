//! Download Orchestrator Core Library
//!
//! The control plane of a download manager: it sits between user-facing
//! surfaces (popup UI, context menu, page content) and a download engine
//! that performs the transfers.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`engine`] - Contract with the download engine, plus an in-memory engine
//! - [`router`] - Request/reply message router for UI commands
//! - [`update`] - Polling progress aggregator driving the badge
//! - [`links`] - Link extraction and `add-new` list parsing
//! - [`menu`] - Context menu entries and click dispatch
//! - [`config`] - Download tuning profile and its file format
//! - [`host`] - Badge, notifications, and native reveal/open
//! - [`ui`] - Broadcast channel to listening UI instances
//! - [`app`] - Wiring of all of the above

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod config;
pub mod engine;
pub mod host;
pub mod links;
pub mod menu;
pub mod router;
pub mod ui;
pub mod update;

// Re-export commonly used types
pub use app::Orchestrator;
pub use config::{ConfigError, ConfigurationProfile};
pub use engine::{
    ChangeInfo, DownloadEngine, DownloadId, DownloadRecord, DownloadState, EngineError,
    MemoryEngine, SearchQuery,
};
pub use host::{ConsoleHost, Host, Notifier, RecordingHost};
pub use links::{LinkRequest, extract_links, parse_link_list};
pub use menu::{ActivePage, ClickInfo, MenuDispatcher, MenuOutcome, SelectionSnapshot};
pub use router::{Reply, Request, Router};
pub use ui::{Broadcast, UiChannel};
pub use update::{DEFAULT_POLL_INTERVAL, UpdateLoop, badge_text};
