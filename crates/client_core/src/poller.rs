use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use futures::future::join_all;
use shared::{
    domain::{BotId, BotRecord, BotStatus},
    error::ClientError,
    protocol::BotStatusResponse,
};
use tokio::{
    task::{JoinHandle, JoinSet},
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{api::BotApi, notifier::Notifier, store::DashboardStore};

/// Builds the next record for one bot from a poll outcome.
///
/// Success replaces the status wholesale. Failure keeps every previous
/// field except `is_ready` (cleared) and `last_error` (set).
pub fn apply_poll_outcome(
    previous: &BotRecord,
    outcome: Result<BotStatusResponse, ClientError>,
) -> BotRecord {
    let status = match outcome {
        Ok(response) => {
            let device_id = non_empty(response.device_id);
            BotStatus {
                is_ready: true,
                is_authenticated: response.is_authenticated,
                remote_display_name: non_empty(response.display_name),
                last_error: None,
                has_friend_token: device_id.is_some(),
                device_id,
                account_id: non_empty(response.account_id),
                expires_at: non_empty(response.expires_at),
            }
        }
        Err(err) => BotStatus {
            is_ready: false,
            last_error: Some(err.to_string()),
            ..previous.status.clone()
        },
    };

    BotRecord {
        id: previous.id.clone(),
        display_name: previous.display_name.clone(),
        status,
    }
}

/// Only false -> true counts; staying authenticated or losing the session
/// is silent.
pub fn became_authenticated(previous: &BotStatus, next: &BotStatus) -> bool {
    !previous.is_authenticated && next.is_authenticated
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub polled: Vec<BotId>,
    pub skipped: Vec<BotId>,
    pub failed: Vec<BotId>,
    pub newly_authenticated: Vec<BotId>,
}

/// Releases a bot's in-flight slot even when the query is cancelled.
struct InFlightGuard<'a> {
    set: &'a Mutex<HashSet<BotId>>,
    bot_id: BotId,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut guard = self.set.lock().unwrap_or_else(|err| err.into_inner());
        guard.remove(&self.bot_id);
    }
}

pub struct StatusPoller {
    api: Arc<dyn BotApi>,
    store: Arc<DashboardStore>,
    notifier: Notifier,
    interval: Duration,
    next_cycle: AtomicU64,
    in_flight: Mutex<HashSet<BotId>>,
}

impl StatusPoller {
    pub fn new(
        api: Arc<dyn BotApi>,
        store: Arc<DashboardStore>,
        notifier: Notifier,
        interval: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            api,
            store,
            notifier,
            interval,
            next_cycle: AtomicU64::new(0),
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    fn claim(&self, bot_id: &BotId) -> Option<InFlightGuard<'_>> {
        let mut guard = self.in_flight.lock().unwrap_or_else(|err| err.into_inner());
        if !guard.insert(bot_id.clone()) {
            return None;
        }
        Some(InFlightGuard {
            set: &self.in_flight,
            bot_id: bot_id.clone(),
        })
    }

    /// `None` when the bot's previous query is still outstanding. The slot
    /// stays claimed until the caller drops the guard.
    async fn poll_one(
        &self,
        cycle: u64,
        bot_id: BotId,
    ) -> (
        BotId,
        Option<(InFlightGuard<'_>, Result<BotStatusResponse, ClientError>)>,
    ) {
        let Some(slot) = self.claim(&bot_id) else {
            debug!(cycle, bot_id = %bot_id, "previous status query still in flight; skipping");
            return (bot_id, None);
        };

        let outcome = self.api.fetch_bot_status(&bot_id).await;
        if let Err(err) = &outcome {
            warn!(cycle, bot_id = %bot_id, error = %err, "bot status query failed");
        }
        (bot_id, Some((slot, outcome)))
    }

    /// One poll cycle: query every bot concurrently, then merge all results
    /// into the store in a single write.
    ///
    /// Each result is applied to the bot's current record, not to the one
    /// seen when the cycle started, so an overlapping cycle that finished
    /// first is never rolled back and a transition is reported once. A bot
    /// skipped because of an outstanding query is left untouched.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = self.next_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        let bot_ids = self
            .store
            .bots()
            .await
            .into_iter()
            .map(|bot| bot.id)
            .collect::<Vec<_>>();

        let outcomes = join_all(bot_ids.into_iter().map(|id| self.poll_one(cycle, id))).await;

        let mut report = CycleReport {
            cycle,
            ..CycleReport::default()
        };
        // Slots are held until the merge so a later cycle cannot land a
        // newer result for the same bot first.
        let mut slots = Vec::new();
        let mut polled = HashMap::new();
        for (bot_id, outcome) in outcomes {
            match outcome {
                None => report.skipped.push(bot_id),
                Some((slot, outcome)) => {
                    slots.push(slot);
                    report.polled.push(bot_id.clone());
                    if outcome.is_err() {
                        report.failed.push(bot_id.clone());
                    }
                    polled.insert(bot_id, outcome);
                }
            }
        }

        let authenticated = self
            .store
            .update_bots(cycle, |bots| {
                let mut authenticated = Vec::new();
                for bot in bots.iter_mut() {
                    let Some(outcome) = polled.remove(&bot.id) else {
                        continue;
                    };
                    let next = apply_poll_outcome(bot, outcome);
                    if became_authenticated(&bot.status, &next.status) {
                        authenticated.push((bot.id.clone(), bot.display_name.clone()));
                    }
                    *bot = next;
                }
                authenticated
            })
            .await;
        drop(slots);

        for (bot_id, display_name) in authenticated {
            self.notifier.success(
                format!("{display_name} authenticated successfully!"),
                Some(bot_id.clone()),
            );
            report.newly_authenticated.push(bot_id);
        }

        info!(
            cycle,
            polled = report.polled.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "poll cycle applied"
        );
        report
    }

    /// Runs a cycle now and then on every interval tick until the handle is
    /// stopped or dropped. Cycles are not awaited by the timer, so a slow
    /// cycle never delays the next tick.
    pub fn start(self: &Arc<Self>) -> PollerHandle {
        let poller = Arc::clone(self);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poller.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut cycles = JoinSet::new();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let poller = Arc::clone(&poller);
                        cycles.spawn(async move { poller.run_cycle().await });
                    }
                    Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                        if let Err(err) = joined {
                            warn!(error = %err, "poll cycle task ended abnormally");
                        }
                    }
                }
            }
        });
        info!(interval_secs = self.interval.as_secs_f64(), "status poller started");
        PollerHandle { task: Some(task) }
    }
}

/// Owns the periodic task. Dropping it cancels the timer and every cycle
/// still in flight, so no state write lands after teardown.
pub struct PollerHandle {
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub async fn stop(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = task.await;
            info!("status poller stopped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/poller_tests.rs"]
mod tests;
