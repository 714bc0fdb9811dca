use std::sync::Arc;

use shared::{
    error::ClientError,
    protocol::{FriendRequestBody, FriendRequestError, FriendRequestResponse, FriendRequestResult},
};
use tracing::{info, warn};

use crate::{api::BotApi, notifier::Notifier, store::DashboardStore};

pub const BLANK_USERNAME_MESSAGE: &str = "please enter a username";
pub const ALREADY_SENDING_MESSAGE: &str = "a friend request is already being sent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered {
        results: Vec<FriendRequestResult>,
    },
    /// The backend answered, but at least one bot reported an error.
    PartialFailure {
        results: Vec<FriendRequestResult>,
        errors: Vec<FriendRequestError>,
    },
    Failed(ClientError),
    /// Another submission was still outstanding; nothing was sent.
    AlreadyInFlight,
}

impl DispatchOutcome {
    pub fn reached_backend(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::PartialFailure { .. })
    }
}

pub struct FriendRequestDispatcher {
    api: Arc<dyn BotApi>,
    store: Arc<DashboardStore>,
    notifier: Notifier,
}

impl FriendRequestDispatcher {
    pub fn new(api: Arc<dyn BotApi>, store: Arc<DashboardStore>, notifier: Notifier) -> Self {
        Self {
            api,
            store,
            notifier,
        }
    }

    /// Submits whatever is currently in the username input.
    pub async fn submit_input(&self) -> DispatchOutcome {
        let username = self.store.username_input().await;
        self.submit(&username).await
    }

    /// Sends one fan-out request for `username` and reports every per-bot
    /// outcome as a notice. Never returns an error to the caller; failures
    /// are carried in the outcome and surfaced as notices.
    pub async fn submit(&self, username: &str) -> DispatchOutcome {
        let username = username.trim();
        if username.is_empty() {
            self.notifier.error(BLANK_USERNAME_MESSAGE, None);
            return DispatchOutcome::Failed(ClientError::validation(BLANK_USERNAME_MESSAGE));
        }

        if !self.store.begin_submission().await {
            self.notifier.info(ALREADY_SENDING_MESSAGE, None);
            return DispatchOutcome::AlreadyInFlight;
        }

        info!(username, "dispatching friend request to all bots");
        let outcome = match self
            .api
            .send_friend_request(&FriendRequestBody::all_bots(username))
            .await
        {
            Ok(response) => self.report_response(response),
            Err(err) => {
                self.report_failure(&err);
                DispatchOutcome::Failed(err)
            }
        };

        self.store
            .finish_submission(outcome.reached_backend())
            .await;
        outcome
    }

    fn report_response(&self, response: FriendRequestResponse) -> DispatchOutcome {
        let results = response.results.unwrap_or_default();
        let errors = response.errors.unwrap_or_default();

        for result in &results {
            let message = format!("{} ({})", result.message, result.bot_id);
            if result.is_success() {
                self.notifier.success(message, Some(result.bot_id.clone()));
            } else {
                self.notifier.info(message, Some(result.bot_id.clone()));
            }
        }
        for error in &errors {
            self.notifier.error(
                format!("error with {}: {}", error.bot_id, error.error),
                Some(error.bot_id.clone()),
            );
        }

        info!(
            delivered = results.len(),
            failed = errors.len(),
            "friend request dispatch finished"
        );
        if errors.is_empty() {
            DispatchOutcome::Delivered { results }
        } else {
            DispatchOutcome::PartialFailure { results, errors }
        }
    }

    fn report_failure(&self, err: &ClientError) {
        warn!(error = %err, "friend request dispatch failed");
        match err {
            ClientError::Rejected { message, .. } => self.notifier.error(message.clone(), None),
            other => self
                .notifier
                .error(format!("failed to send friend requests: {other}"), None),
        }
    }
}

#[cfg(test)]
#[path = "tests/dispatcher_tests.rs"]
mod tests;
