//! HTTP and WebSocket round trips against a server bound to an
//! ephemeral port.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;

use storage_pools::api;
use storage_pools::app_state::AppState;
use storage_pools::config::LedgerConfig;
use storage_pools::custody::{InMemoryTokenLedger, TokenLedger};
use storage_pools::domain::{AccountId, EventBus};
use storage_pools::governance::{
    Capability, Clock, PauseGate, PauseSwitch, RoleAuthority, StaticRoleAuthority, SystemClock,
};
use storage_pools::service::{Collaborators, PoolService};
use storage_pools::ws::handler::ws_handler;

fn app_state() -> AppState {
    let config = LedgerConfig {
        pool_creation_lock_amount: 500,
        ..LedgerConfig::default()
    };
    let ledger = Arc::new(InMemoryTokenLedger::new(config.custody_account.clone()));
    let roles = StaticRoleAuthority::new().with_grant(Capability::Admin, AccountId::from("root"));
    let collaborators = Collaborators {
        token_ledger: Arc::clone(&ledger) as Arc<dyn TokenLedger>,
        roles: Arc::new(roles) as Arc<dyn RoleAuthority>,
        pause: Arc::new(PauseSwitch::new()) as Arc<dyn PauseGate>,
        clock: Arc::new(SystemClock) as Arc<dyn Clock>,
    };
    let event_bus = EventBus::new(128);
    let pool_service = Arc::new(PoolService::new(config, collaborators, event_bus.clone()));
    AppState {
        pool_service,
        event_bus,
        dev_ledger: Some(ledger),
    }
}

async fn spawn_server() -> SocketAddr {
    let app = api::with_middleware(
        api::build_router().route("/ws", get(ws_handler)),
        Duration::from_secs(5),
    );
    serve(app.with_state(app_state())).await
}

async fn serve(app: axum::Router) -> SocketAddr {
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind ephemeral port");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("listener address");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

async fn post_as(
    client: &reqwest::Client,
    url: String,
    account: &str,
    body: Value,
) -> reqwest::Response {
    let Ok(resp) = client
        .post(&url)
        .header("x-account-id", account)
        .json(&body)
        .send()
        .await
    else {
        panic!("POST {url}");
    };
    resp
}

async fn fetch(url: String) -> reqwest::Response {
    let Ok(resp) = reqwest::get(&url).await else {
        panic!("GET {url}");
    };
    resp
}

async fn body_json(resp: reqwest::Response) -> Value {
    let Ok(body) = resp.json::<Value>().await else {
        panic!("JSON body");
    };
    body
}

async fn fund(client: &reqwest::Client, base: &str, account: &str, amount: u128) {
    let minted = post_as(
        client,
        format!("{base}/api/v1/ledger/mint"),
        "root",
        json!({ "account": account, "amount": amount.to_string() }),
    )
    .await;
    assert_eq!(minted.status(), StatusCode::CREATED);
    let approved = post_as(
        client,
        format!("{base}/api/v1/ledger/approve"),
        account,
        json!({ "amount": amount.to_string() }),
    )
    .await;
    assert_eq!(approved.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_reports_ok() {
    let addr = spawn_server().await;
    let resp = fetch(format!("http://{addr}/health")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn create_pool_and_join_over_rest() {
    let addr = spawn_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    fund(&client, &base, "alice", 500).await;
    fund(&client, &base, "bob", 100).await;

    let created = post_as(
        &client,
        format!("{base}/api/v1/pools"),
        "alice",
        json!({
            "name": "berlin-1",
            "region": "eu-central",
            "required_tokens": "100",
            "max_members": 5,
            "creator_peer_id": "alice-1",
        }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let pool = body_json(created).await;
    assert_eq!(pool["pool_id"], 1);
    assert_eq!(pool["member_count"], 1);
    assert_eq!(pool["required_tokens"], "100");

    let submitted = post_as(
        &client,
        format!("{base}/api/v1/pools/1/join-requests"),
        "bob",
        json!({ "peer_id": "bob-1" }),
    )
    .await;
    assert_eq!(submitted.status(), StatusCode::CREATED);

    let voted = post_as(
        &client,
        format!("{base}/api/v1/pools/1/join-requests/bob-1/votes"),
        "alice",
        json!({ "voter_peer_id": "alice-1", "approve": true }),
    )
    .await;
    assert_eq!(voted.status(), StatusCode::OK);
    let vote = body_json(voted).await;
    assert_eq!(vote["status"], "approved");

    let slot = body_json(fetch(format!("{base}/api/v1/pools/1/members/bob-1")).await).await;
    assert_eq!(slot["is_member"], true);
    assert_eq!(slot["locked_tokens"], "100");

    let list = body_json(fetch(format!("{base}/api/v1/pools?page=1&per_page=10")).await).await;
    assert_eq!(list["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn errors_use_the_structured_envelope() {
    let addr = spawn_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let Ok(anonymous) = client
        .post(format!("{base}/api/v1/pools"))
        .json(&json!({ "name": "x", "region": "y", "required_tokens": "1" }))
        .send()
        .await
    else {
        panic!("anonymous POST");
    };
    assert_eq!(anonymous.status(), StatusCode::FORBIDDEN);

    let missing = fetch(format!("{base}/api/v1/pools/42")).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body = body_json(missing).await;
    assert_eq!(body["error"]["code"], 2001);

    let broke = post_as(
        &client,
        format!("{base}/api/v1/pools"),
        "carol",
        json!({ "name": "x", "region": "y", "required_tokens": "1" }),
    )
    .await;
    assert_eq!(broke.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn websocket_streams_subscribed_pool_events() {
    let addr = spawn_server().await;
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();
    fund(&client, &base, "alice", 500).await;
    fund(&client, &base, "bob", 100).await;

    let created = post_as(
        &client,
        format!("{base}/api/v1/pools"),
        "alice",
        json!({ "name": "oslo", "region": "eu-north", "required_tokens": "50" }),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);

    let Ok((mut ws, _)) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await else {
        panic!("websocket handshake");
    };
    let subscribe = json!({
        "id": "sub-1",
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": { "command": "subscribe", "pool_ids": ["1"] },
    });
    assert!(ws.send(Message::text(subscribe.to_string())).await.is_ok());

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "response");
    assert_eq!(reply["id"], "sub-1");

    let submitted = post_as(
        &client,
        format!("{base}/api/v1/pools/1/join-requests"),
        "bob",
        json!({ "peer_id": "bob-1" }),
    )
    .await;
    assert_eq!(submitted.status(), StatusCode::CREATED);

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "event");
    assert_eq!(event["payload"]["event_type"], "join_request_submitted");
    assert_eq!(event["payload"]["peer_id"], "bob-1");
}

async fn next_json<S>(ws: &mut S) -> Value
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let Ok(next) = tokio::time::timeout(Duration::from_secs(5), ws.next()).await else {
            panic!("websocket message within timeout");
        };
        let Some(Ok(msg)) = next else {
            panic!("websocket closed");
        };
        if let Message::Text(text) = msg {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("websocket frame is JSON: {text}");
            };
            return value;
        }
    }
}

#[tokio::test]
async fn slow_requests_time_out() {
    let slow = axum::Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            "late"
        }),
    );
    let app = api::with_middleware(slow, Duration::from_millis(50));
    let addr = serve(app.with_state(app_state())).await;

    let resp = fetch(format!("http://{addr}/slow")).await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
}
