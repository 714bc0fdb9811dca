use serde::{Deserialize, Serialize};

use crate::domain::BotId;

/// Body of `GET /bot2/api/bot-status?botId=..`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatusResponse {
    #[serde(default)]
    pub is_authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestBody {
    pub username: String,
    pub send_from_all_bots: bool,
}

impl FriendRequestBody {
    pub fn all_bots(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            send_from_all_bots: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestResult {
    pub status: String,
    #[serde(default)]
    pub message: String,
    pub bot_id: BotId,
}

impl FriendRequestResult {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequestError {
    pub bot_id: BotId,
    pub error: String,
}

/// `results` and `errors` are independent; both may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequestResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<FriendRequestResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FriendRequestError>>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
