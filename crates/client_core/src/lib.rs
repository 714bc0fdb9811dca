use std::{sync::Arc, time::Duration};

use shared::error::ClientError;

pub mod api;
pub mod config;
pub mod dispatcher;
pub mod notifier;
pub mod poller;
pub mod registry;
pub mod store;

pub use api::{BotApi, HttpBotApi};
pub use config::{load_settings, ClientSettings};
pub use dispatcher::{DispatchOutcome, FriendRequestDispatcher};
pub use notifier::{Notice, NoticeKind, Notifier, VisibleNotices};
pub use poller::{CycleReport, PollerHandle, StatusPoller};
pub use registry::BotRegistry;
pub use store::{DashboardSnapshot, DashboardStore, StoreUpdate, SystemSummary};

/// The bot dashboard: one store shared by a timer-driven poller and a
/// user-driven dispatcher, with notices fanned out to any view.
pub struct BotDashboard {
    store: Arc<DashboardStore>,
    notifier: Notifier,
    poller: Arc<StatusPoller>,
    dispatcher: FriendRequestDispatcher,
}

impl BotDashboard {
    pub fn new(registry: BotRegistry, api: Arc<dyn BotApi>, poll_interval: Duration) -> Self {
        let store = Arc::new(DashboardStore::new(registry.into_records()));
        let notifier = Notifier::new();
        let poller = StatusPoller::new(
            Arc::clone(&api),
            Arc::clone(&store),
            notifier.clone(),
            poll_interval,
        );
        let dispatcher = FriendRequestDispatcher::new(api, Arc::clone(&store), notifier.clone());
        Self {
            store,
            notifier,
            poller,
            dispatcher,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ClientError> {
        let api = HttpBotApi::new(settings)?;
        Ok(Self::new(
            BotRegistry::from_entries(&settings.bots),
            Arc::new(api),
            settings.poll_interval(),
        ))
    }

    /// Starts polling. Keep the handle for as long as the view is shown.
    pub fn activate(&self) -> PollerHandle {
        self.poller.start()
    }

    pub async fn refresh(&self) -> CycleReport {
        self.poller.run_cycle().await
    }

    pub async fn submit_friend_request(&self, username: &str) -> DispatchOutcome {
        self.dispatcher.submit(username).await
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.store.snapshot().await
    }

    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn dispatcher(&self) -> &FriendRequestDispatcher {
        &self.dispatcher
    }
}
