use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT},
    Client, Response,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::BotId,
    error::ClientError,
    protocol::{BotStatusResponse, ErrorBody, FriendRequestBody, FriendRequestResponse},
};
use tracing::{debug, warn};

use crate::config::ClientSettings;

pub const BOT_STATUS_PATH: &str = "/bot2/api/bot-status";
pub const FRIEND_REQUEST_PATH: &str = "/bot2/api/friend-request";

/// Remote bot backend. Fan-out to individual bots happens on the far side.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn fetch_bot_status(&self, bot_id: &BotId) -> Result<BotStatusResponse, ClientError>;
    async fn send_friend_request(
        &self,
        body: &FriendRequestBody,
    ) -> Result<FriendRequestResponse, ClientError>;
}

pub struct HttpBotApi {
    http: Client,
    base_url: String,
}

impl HttpBotApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some((name, value)) = &settings.bypass_header {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ClientError::Config(format!("bypass header name: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ClientError::Config(format!("bypass header value: {err}")))?;
            headers.insert(name, value);
        }

        let http = Client::builder()
            .default_headers(headers)
            .timeout(settings.request_timeout())
            .build()
            .map_err(|err| ClientError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BotApi for HttpBotApi {
    async fn fetch_bot_status(&self, bot_id: &BotId) -> Result<BotStatusResponse, ClientError> {
        let url = format!("{}{BOT_STATUS_PATH}", self.base_url);
        debug!(%url, bot_id = %bot_id, "requesting bot status");
        let response = self
            .http
            .get(&url)
            .query(&[("botId", bot_id.as_str())])
            .send()
            .await
            .map_err(|err| ClientError::transport(err.to_string()))?;
        decode_response(response).await
    }

    async fn send_friend_request(
        &self,
        body: &FriendRequestBody,
    ) -> Result<FriendRequestResponse, ClientError> {
        let url = format!("{}{FRIEND_REQUEST_PATH}", self.base_url);
        debug!(%url, username = %body.username, "sending friend request");
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| ClientError::transport(err.to_string()))?;
        decode_response(response).await
    }
}

/// Reads the body as text first so a non-JSON body on a 2xx is a parse
/// failure, and a non-2xx surfaces the server's `error` message if any.
async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|err| ClientError::transport(err.to_string()))?;

    if !status.is_success() {
        warn!(status = status.as_u16(), "remote api returned failure status");
        return Err(match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { error }) => ClientError::Rejected {
                status: status.as_u16(),
                message: error,
            },
            Err(_) => ClientError::transport(format!("unexpected status {status}")),
        });
    }

    serde_json::from_str(&body).map_err(|err| ClientError::parse(err.to_string()))
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
