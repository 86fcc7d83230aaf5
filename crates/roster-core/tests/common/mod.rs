//! Local stand-ins for the roster endpoint, relays and identity lookup.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::json;

/// Paths hit on the fake server, in arrival order.
#[derive(Clone, Default)]
pub struct HitLog(Arc<Mutex<Vec<String>>>);

impl HitLog {
    pub fn push(&self, path: &str) {
        self.0.lock().unwrap().push(path.to_string());
    }

    pub fn hits(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub fn roster_body(host: &str) -> serde_json::Value {
    json!({
        "dynamic": {"hostname": format!("server at {}", host), "clients": 3},
        "players": [
            {"id": 7, "name": "Ann", "ping": 30, "identifiers": ["discord:55"], "endpoint": "10.0.0.2"},
            {"id": 2, "name": "Bob", "ping": 80, "identifiers": ["license:abc"], "endpoint": "127.0.0.1"},
            {"id": 12, "name": "Andy", "ping": 45, "identifiers": ["steam:1", "discord:1200"], "endpoint": "10.0.0.9"}
        ]
    })
}

async fn roster(
    State(log): State<HitLog>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    log.push("/fivem/");
    let host = q.get("ip_address").cloned().unwrap_or_default();
    Json(roster_body(&host))
}

async fn slow(State(log): State<HitLog>) -> Json<serde_json::Value> {
    log.push("/slow/");
    tokio::time::sleep(Duration::from_secs(5)).await;
    Json(roster_body("slow"))
}

async fn down(State(log): State<HitLog>) -> StatusCode {
    log.push("/down");
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn unavailable(State(log): State<HitLog>) -> StatusCode {
    log.push("/unavailable");
    StatusCode::SERVICE_UNAVAILABLE
}

/// Relay that answers on behalf of the wrapped target URL.
async fn relay(
    State(log): State<HitLog>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    log.push("/relay");
    let Some(target) = q.get("url") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if !target.contains("ip_address=") {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let mut body = roster_body("relay");
    body["dynamic"]["via"] = json!("relay");
    body["dynamic"]["target"] = json!(target);
    Json(body).into_response()
}

async fn remote_error(State(log): State<HitLog>) -> Json<serde_json::Value> {
    log.push("/error/");
    Json(json!({"error": "Server not found"}))
}

async fn garbage(State(log): State<HitLog>) -> &'static str {
    log.push("/garbage/");
    "<html>rate limited</html>"
}

/// Identity lookup: 55 resolves after a short delay, 1200 hangs, 77 has no
/// avatar, 88 is not JSON, 99 is a server error and anything else 404s.
async fn lookup(Query(q): Query<HashMap<String, String>>) -> Response {
    match q.get("user_id").map(String::as_str) {
        Some("55") => {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Json(json!({"id": "55", "avatar": "a1b2c3"})).into_response()
        }
        Some("1200") => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"id": "1200", "avatar": "late"})).into_response()
        }
        Some("77") => Json(json!({"id": "77"})).into_response(),
        Some("88") => "not json".into_response(),
        Some("99") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn spawn_server() -> (SocketAddr, HitLog) {
    let log = HitLog::default();
    let app = Router::new()
        .route("/fivem/", get(roster))
        .route("/slow/", get(slow))
        .route("/down", get(down))
        .route("/unavailable", get(unavailable))
        .route("/relay", get(relay))
        .route("/error/", get(remote_error))
        .route("/garbage/", get(garbage))
        .route("/a.php", get(lookup))
        .with_state(log.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    (addr, log)
}

/// An address nothing is listening on.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.local_addr().expect("local addr")
}
