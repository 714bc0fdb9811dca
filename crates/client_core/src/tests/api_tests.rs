use super::*;

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Query, State},
    http::{HeaderMap as AxumHeaders, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Captured {
    status_queries: Arc<Mutex<Vec<(String, Option<String>)>>>,
    friend_bodies: Arc<Mutex<Vec<serde_json::Value>>>,
}

async fn handle_status(
    State(captured): State<Captured>,
    headers: AxumHeaders,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let bot_id = query.get("botId").cloned().unwrap_or_default();
    let bypass = headers
        .get("ngrok-skip-browser-warning")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    captured
        .status_queries
        .lock()
        .await
        .push((bot_id.clone(), bypass));

    match bot_id.as_str() {
        "html" => (StatusCode::OK, "<html>tunnel warning</html>".to_string()).into_response(),
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "unknown bot" })),
        )
            .into_response(),
        "broken" => (StatusCode::BAD_GATEWAY, "upstream down".to_string()).into_response(),
        _ => Json(serde_json::json!({
            "isAuthenticated": true,
            "displayName": format!("remote-{bot_id}"),
            "deviceId": "device-1",
            "accountId": "account-1",
            "expiresAt": "2030-01-01T00:00:00Z"
        }))
        .into_response(),
    }
}

async fn handle_friend_request(
    State(captured): State<Captured>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    captured.friend_bodies.lock().await.push(body.clone());
    if body["username"] == "banned" {
        return (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": "user is banned" })),
        )
            .into_response();
    }
    Json(serde_json::json!({
        "results": [{ "status": "success", "message": "request sent", "botId": "bot1" }],
        "errors": [{ "botId": "bot2", "error": "already friends" }]
    }))
    .into_response()
}

async fn spawn_api_server() -> anyhow::Result<(String, Captured)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let captured = Captured::default();
    let app = Router::new()
        .route(BOT_STATUS_PATH, get(handle_status))
        .route(FRIEND_REQUEST_PATH, post(handle_friend_request))
        .with_state(captured.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), captured))
}

fn api_for(base_url: &str) -> HttpBotApi {
    let settings = ClientSettings {
        api_base_url: format!("{base_url}/"),
        ..ClientSettings::default()
    };
    HttpBotApi::new(&settings).expect("client")
}

#[tokio::test]
async fn fetch_bot_status_sends_bot_id_and_bypass_header() {
    let (base_url, captured) = spawn_api_server().await.expect("spawn server");
    let api = api_for(&base_url);

    let status = api
        .fetch_bot_status(&BotId::from("bot1"))
        .await
        .expect("status");

    assert!(status.is_authenticated);
    assert_eq!(status.display_name.as_deref(), Some("remote-bot1"));
    assert_eq!(status.device_id.as_deref(), Some("device-1"));
    let queries = captured.status_queries.lock().await;
    assert_eq!(
        queries.as_slice(),
        &[("bot1".to_string(), Some("true".to_string()))]
    );
}

#[tokio::test]
async fn non_json_success_body_is_parse_error() {
    let (base_url, _captured) = spawn_api_server().await.expect("spawn server");
    let err = api_for(&base_url)
        .fetch_bot_status(&BotId::from("html"))
        .await
        .expect_err("html body");
    assert!(matches!(err, ClientError::Parse(_)), "unexpected: {err:?}");
}

#[tokio::test]
async fn failure_status_with_error_body_is_rejected() {
    let (base_url, _captured) = spawn_api_server().await.expect("spawn server");
    let err = api_for(&base_url)
        .fetch_bot_status(&BotId::from("missing"))
        .await
        .expect_err("404");
    assert_eq!(
        err,
        ClientError::Rejected {
            status: 404,
            message: "unknown bot".to_string()
        }
    );
}

#[tokio::test]
async fn failure_status_without_error_body_is_transport_error() {
    let (base_url, _captured) = spawn_api_server().await.expect("spawn server");
    let err = api_for(&base_url)
        .fetch_bot_status(&BotId::from("broken"))
        .await
        .expect_err("502");
    assert!(matches!(err, ClientError::Transport(_)), "unexpected: {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = api_for(&format!("http://{addr}"))
        .fetch_bot_status(&BotId::from("bot1"))
        .await
        .expect_err("connection refused");
    assert!(matches!(err, ClientError::Transport(_)), "unexpected: {err:?}");
}

#[tokio::test]
async fn friend_request_posts_fan_out_body() {
    let (base_url, captured) = spawn_api_server().await.expect("spawn server");
    let response = api_for(&base_url)
        .send_friend_request(&FriendRequestBody::all_bots("player"))
        .await
        .expect("response");

    assert_eq!(response.results.map(|r| r.len()), Some(1));
    assert_eq!(response.errors.map(|e| e.len()), Some(1));
    let bodies = captured.friend_bodies.lock().await;
    assert_eq!(
        bodies.as_slice(),
        &[serde_json::json!({ "username": "player", "sendFromAllBots": true })]
    );
}

#[tokio::test]
async fn friend_request_rejection_carries_server_message() {
    let (base_url, _captured) = spawn_api_server().await.expect("spawn server");
    let err = api_for(&base_url)
        .send_friend_request(&FriendRequestBody::all_bots("banned"))
        .await
        .expect_err("forbidden");
    assert_eq!(err.to_string(), "user is banned");
}

#[test]
fn invalid_bypass_header_name_is_config_error() {
    let settings = ClientSettings {
        bypass_header: Some(("bad header".into(), "true".into())),
        ..ClientSettings::default()
    };
    assert!(matches!(
        HttpBotApi::new(&settings),
        Err(ClientError::Config(_))
    ));
}
