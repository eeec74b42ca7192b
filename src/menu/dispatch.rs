//! Click handling for context menu commands.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{ActivePage, ClickInfo, MenuCommand};
use crate::engine::{DownloadEngine, DownloadOptions};
use crate::links::merge_links;
use crate::router::{Reply, Request, Router};

/// First line of the confirmation prompt; the links follow one per line.
pub const CONFIRM_HEADER: &str = "Confirm Downloading:\n\n";

/// Alert shown when the selection holds no link.
pub const NO_SELECTION_LINK_MESSAGE: &str = "There is no link in the active selection";

/// Thread count requested for every link collected from a selection.
pub const EXTRACT_THREADS: u32 = 3;

/// Result of handling one click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    /// This many links were submitted.
    Submitted(usize),
    /// The user declined the confirmation.
    Declined,
    /// The selection held no link; the user was told.
    NoLinks,
    /// Unknown command, or no URL to act on.
    Ignored,
}

/// Routes menu clicks to the selection flow or to a direct download.
#[derive(Clone)]
pub struct MenuDispatcher {
    router: Arc<Router>,
    engine: Arc<dyn DownloadEngine>,
}

impl std::fmt::Debug for MenuDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MenuDispatcher")
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl MenuDispatcher {
    /// Creates a dispatcher. Direct downloads go straight to `engine` under
    /// the router's default profile; selections go through `router`.
    #[must_use]
    pub fn new(router: Arc<Router>, engine: Arc<dyn DownloadEngine>) -> Self {
        Self { router, engine }
    }

    /// Handles one click on the page `page`.
    #[instrument(skip_all, fields(item = %info.menu_item_id))]
    pub async fn on_clicked(&self, info: &ClickInfo, page: &dyn ActivePage) -> MenuOutcome {
        let command = match info.menu_item_id.parse::<MenuCommand>() {
            Ok(command) => command,
            Err(error) => {
                debug!(error = %error, "ignoring click");
                return MenuOutcome::Ignored;
            }
        };

        if command == MenuCommand::ExtractLinks {
            return self.extract_from_selection(page).await;
        }

        let Some(url) = info.target_url(command) else {
            warn!(%command, "click carried no URL");
            return MenuOutcome::Ignored;
        };
        match self
            .engine
            .download(DownloadOptions::new(url), self.router.profile())
            .await
        {
            Ok(id) => {
                info!(%id, url, "direct download submitted");
                MenuOutcome::Submitted(1)
            }
            Err(error) => {
                warn!(url, error = %error, "engine rejected download");
                MenuOutcome::Submitted(0)
            }
        }
    }

    async fn extract_from_selection(&self, page: &dyn ActivePage) -> MenuOutcome {
        let snapshot = page.capture_selection().await.unwrap_or_default();

        let extracted = match self
            .router
            .handle(Request::ExtractLinks {
                content: snapshot.markup,
            })
            .await
        {
            Some(Reply::Links(links)) => links,
            _ => Vec::new(),
        };
        let links = merge_links(snapshot.anchors.into_iter().chain(extracted));

        if links.is_empty() {
            page.alert(NO_SELECTION_LINK_MESSAGE).await;
            return MenuOutcome::NoLinks;
        }

        let prompt = format!("{CONFIRM_HEADER}{}", links.join("\n"));
        if !page.confirm(&prompt).await {
            debug!(count = links.len(), "selection download declined");
            return MenuOutcome::Declined;
        }

        let value = links
            .iter()
            .map(|link| format!("{EXTRACT_THREADS}|{link}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.router.handle(Request::AddNew { value }).await;
        MenuOutcome::Submitted(links.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::config::ConfigurationProfile;
    use crate::engine::MemoryEngine;
    use crate::host::RecordingHost;
    use crate::menu::SelectionSnapshot;
    use crate::ui::UiChannel;
    use crate::update::{DEFAULT_POLL_INTERVAL, UpdateLoop};

    struct FakePage {
        selection: Option<SelectionSnapshot>,
        accept: bool,
        prompts: Mutex<Vec<String>>,
        alerts: Mutex<Vec<String>>,
    }

    impl FakePage {
        fn new(selection: Option<SelectionSnapshot>, accept: bool) -> Self {
            Self {
                selection,
                accept,
                prompts: Mutex::new(Vec::new()),
                alerts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ActivePage for FakePage {
        async fn capture_selection(&self) -> Option<SelectionSnapshot> {
            self.selection.clone()
        }

        async fn confirm(&self, message: &str) -> bool {
            self.prompts.lock().unwrap().push(message.to_string());
            self.accept
        }

        async fn alert(&self, message: &str) {
            self.alerts.lock().unwrap().push(message.to_string());
        }
    }

    fn setup() -> (MenuDispatcher, Arc<MemoryEngine>) {
        let engine = Arc::new(MemoryEngine::new());
        let host = Arc::new(RecordingHost::new("test"));
        let update = UpdateLoop::new(
            engine.clone(),
            host.clone(),
            UiChannel::new(),
            DEFAULT_POLL_INTERVAL,
        );
        let router = Router::new(
            engine.clone(),
            host,
            update,
            ConfigurationProfile::default(),
        );
        (MenuDispatcher::new(router, engine.clone()), engine)
    }

    fn click(id: &str) -> ClickInfo {
        ClickInfo {
            menu_item_id: id.to_string(),
            ..ClickInfo::default()
        }
    }

    #[tokio::test]
    async fn test_selection_links_confirmed_and_submitted() {
        let (dispatcher, engine) = setup();
        let page = FakePage::new(
            Some(SelectionSnapshot {
                markup: "see https://a.test/2.zip and https://a.test/1.zip".to_string(),
                anchors: vec!["https://a.test/1.zip".to_string()],
            }),
            true,
        );

        let outcome = dispatcher.on_clicked(&click("extract-links"), &page).await;

        assert_eq!(outcome, MenuOutcome::Submitted(2));
        assert_eq!(
            page.prompts.lock().unwrap().as_slice(),
            ["Confirm Downloading:\n\nhttps://a.test/1.zip\nhttps://a.test/2.zip"]
        );
        let submissions = engine.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(submissions[0].options.url, "https://a.test/1.zip");
        assert_eq!(submissions[1].options.url, "https://a.test/2.zip");
        assert!(submissions.iter().all(|s| s.profile.max_number_of_threads == 3));
    }

    #[tokio::test]
    async fn test_declined_selection_submits_nothing() {
        let (dispatcher, engine) = setup();
        let page = FakePage::new(
            Some(SelectionSnapshot {
                markup: "https://a.test/x".to_string(),
                anchors: Vec::new(),
            }),
            false,
        );

        let outcome = dispatcher.on_clicked(&click("extract-links"), &page).await;

        assert_eq!(outcome, MenuOutcome::Declined);
        assert!(engine.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_empty_selection_alerts_without_prompt() {
        let (dispatcher, engine) = setup();
        let page = FakePage::new(None, true);

        let outcome = dispatcher.on_clicked(&click("extract-links"), &page).await;

        assert_eq!(outcome, MenuOutcome::NoLinks);
        assert!(page.prompts.lock().unwrap().is_empty());
        assert_eq!(
            page.alerts.lock().unwrap().as_slice(),
            [NO_SELECTION_LINK_MESSAGE]
        );
        assert!(engine.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_direct_download_uses_default_profile_without_prompt() {
        let (dispatcher, engine) = setup();
        let page = FakePage::new(None, false);
        let info = ClickInfo {
            link_url: Some("https://a.test/page.html".to_string()),
            src_url: Some("https://a.test/movie.webm".to_string()),
            ..click("download-media")
        };

        let outcome = dispatcher.on_clicked(&info, &page).await;

        assert_eq!(outcome, MenuOutcome::Submitted(1));
        assert!(page.prompts.lock().unwrap().is_empty());
        let submissions = engine.submissions();
        assert_eq!(submissions[0].options.url, "https://a.test/movie.webm");
        assert_eq!(submissions[0].profile, ConfigurationProfile::default());
    }

    #[tokio::test]
    async fn test_unknown_or_empty_click_is_ignored() {
        let (dispatcher, engine) = setup();
        let page = FakePage::new(None, true);

        assert_eq!(
            dispatcher.on_clicked(&click("bookmark"), &page).await,
            MenuOutcome::Ignored
        );
        assert_eq!(
            dispatcher.on_clicked(&click("download-link"), &page).await,
            MenuOutcome::Ignored
        );
        assert!(engine.submissions().is_empty());
    }
}
