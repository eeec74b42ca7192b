//! Background-process wiring: one engine, one host, one UI channel, and the
//! components built on them.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ConfigurationProfile;
use crate::engine::DownloadEngine;
use crate::host::Host;
use crate::menu::{MenuDispatcher, register_context_menus};
use crate::router::Router;
use crate::ui::{Broadcast, UiChannel};
use crate::update::UpdateLoop;

/// The assembled orchestrator.
///
/// Call [`startup`](Self::startup) once the async runtime is running.
pub struct Orchestrator {
    host: Arc<dyn Host>,
    ui: UiChannel,
    update: Arc<UpdateLoop>,
    router: Arc<Router>,
    menu: MenuDispatcher,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("app_name", &self.host.app_name())
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Wires the components. Nothing runs until [`startup`](Self::startup).
    #[must_use]
    pub fn new(
        engine: Arc<dyn DownloadEngine>,
        host: Arc<dyn Host>,
        profile: ConfigurationProfile,
        poll_interval: Duration,
    ) -> Self {
        let ui = UiChannel::new();
        let update = UpdateLoop::new(
            Arc::clone(&engine),
            Arc::clone(&host),
            ui.clone(),
            poll_interval,
        );
        let router = Router::new(
            Arc::clone(&engine),
            Arc::clone(&host),
            Arc::clone(&update),
            profile,
        );
        let menu = MenuDispatcher::new(Arc::clone(&router), engine);
        Self {
            host,
            ui,
            update,
            router,
            menu,
            listener: Mutex::new(None),
        }
    }

    /// Registers the context menus and starts listening to engine changes.
    /// Calling it again re-registers the menus and restarts the listener.
    pub fn startup(&self) {
        register_context_menus(self.host.as_ref());
        let handle = self.update.spawn_change_listener();
        if let Some(previous) = self.listener().replace(handle) {
            previous.abort();
        }
        info!(app = self.host.app_name(), "orchestrator started");
    }

    /// Re-registers the context menus after an install or update.
    pub fn on_installed(&self) {
        register_context_menus(self.host.as_ref());
    }

    /// Stops the change listener and any pending poll.
    pub fn shutdown(&self) {
        if let Some(listener) = self.listener().take() {
            listener.abort();
        }
        self.update.disarm();
        debug!("orchestrator stopped");
    }

    /// Subscribes a UI instance to broadcasts.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Broadcast> {
        self.ui.subscribe()
    }

    /// Router for UI requests.
    #[must_use]
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Dispatcher for context menu clicks.
    #[must_use]
    pub fn menu(&self) -> &MenuDispatcher {
        &self.menu
    }

    /// The polling update loop.
    #[must_use]
    pub fn update_loop(&self) -> &Arc<UpdateLoop> {
        &self.update
    }

    fn listener(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::engine::{DownloadOptions, DownloadState, MemoryEngine};
    use crate::host::RecordingHost;
    use crate::update::DEFAULT_POLL_INTERVAL;

    fn setup() -> (Orchestrator, Arc<MemoryEngine>, Arc<RecordingHost>) {
        let engine = Arc::new(MemoryEngine::new());
        let host = Arc::new(RecordingHost::new("test"));
        let orchestrator = Orchestrator::new(
            engine.clone(),
            host.clone(),
            ConfigurationProfile::default(),
            DEFAULT_POLL_INTERVAL,
        );
        (orchestrator, engine, host)
    }

    #[tokio::test]
    async fn test_startup_and_install_register_menus_each_time() {
        let (orchestrator, _engine, host) = setup();

        orchestrator.startup();
        orchestrator.on_installed();

        assert_eq!(host.context_menus().len(), 8);
        orchestrator.shutdown();
    }

    #[tokio::test]
    async fn test_engine_changes_reach_subscribers_after_startup() {
        let (orchestrator, engine, _host) = setup();
        let mut rx = orchestrator.subscribe();
        orchestrator.startup();

        let id = engine
            .download(
                DownloadOptions::new("https://a.test/x.zip"),
                &ConfigurationProfile::default(),
            )
            .await
            .unwrap();

        let mut saw_prepare_one = false;
        while !saw_prepare_one {
            match rx.recv().await.unwrap() {
                Broadcast::PrepareOne { d } => {
                    assert_eq!(d.id, id);
                    assert_eq!(d.state, DownloadState::InProgress);
                    saw_prepare_one = true;
                }
                Broadcast::BatchUpdate { .. } => {}
                other => panic!("unexpected broadcast {other:?}"),
            }
        }
        assert!(orchestrator.update_loop().is_armed());
        orchestrator.shutdown();
        assert!(!orchestrator.update_loop().is_armed());
    }
}
