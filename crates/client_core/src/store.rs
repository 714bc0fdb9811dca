use shared::domain::BotRecord;
use tokio::sync::{broadcast, RwLock};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUpdate {
    BotsReplaced { revision: u64, cycle: u64 },
    SubmissionChanged { submitting: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSnapshot {
    pub bots: Vec<BotRecord>,
    /// Number of bot-collection writes so far.
    pub revision: u64,
    /// Highest cycle number merged so far.
    pub last_applied_cycle: u64,
    pub submitting: bool,
    pub username_input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemSummary {
    AllOperational,
    NeedsAttention,
}

impl DashboardSnapshot {
    pub fn summary(&self) -> SystemSummary {
        if self.bots.iter().all(|bot| bot.status.is_operational()) {
            SystemSummary::AllOperational
        } else {
            SystemSummary::NeedsAttention
        }
    }
}

/// Single owned state for the dashboard.
///
/// The poller is the only writer of the bot collection; the dispatcher is
/// the only writer of the submission flag and input text.
pub struct DashboardStore {
    inner: RwLock<DashboardSnapshot>,
    updates: broadcast::Sender<StoreUpdate>,
}

impl DashboardStore {
    pub fn new(bots: Vec<BotRecord>) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(DashboardSnapshot {
                bots,
                revision: 0,
                last_applied_cycle: 0,
                submitting: false,
                username_input: String::new(),
            }),
            updates,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreUpdate> {
        self.updates.subscribe()
    }

    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn bots(&self) -> Vec<BotRecord> {
        self.inner.read().await.bots.clone()
    }

    /// Runs `merge` against the current collection under a single write
    /// lock and publishes one update for the whole cycle.
    pub async fn update_bots<R>(
        &self,
        cycle: u64,
        merge: impl FnOnce(&mut Vec<BotRecord>) -> R,
    ) -> R {
        let (result, revision) = {
            let mut guard = self.inner.write().await;
            let result = merge(&mut guard.bots);
            guard.last_applied_cycle = guard.last_applied_cycle.max(cycle);
            guard.revision += 1;
            (result, guard.revision)
        };
        let _ = self
            .updates
            .send(StoreUpdate::BotsReplaced { revision, cycle });
        result
    }

    pub async fn set_username_input(&self, text: impl Into<String>) {
        self.inner.write().await.username_input = text.into();
    }

    pub async fn username_input(&self) -> String {
        self.inner.read().await.username_input.clone()
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.read().await.submitting
    }

    /// Returns `false` when a submission is already outstanding.
    pub async fn begin_submission(&self) -> bool {
        {
            let mut guard = self.inner.write().await;
            if guard.submitting {
                return false;
            }
            guard.submitting = true;
        }
        let _ = self
            .updates
            .send(StoreUpdate::SubmissionChanged { submitting: true });
        true
    }

    pub async fn finish_submission(&self, clear_input: bool) {
        {
            let mut guard = self.inner.write().await;
            guard.submitting = false;
            if clear_input {
                guard.username_input.clear();
            }
        }
        let _ = self
            .updates
            .send(StoreUpdate::SubmissionChanged { submitting: false });
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
