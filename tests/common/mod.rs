// Shared helpers: a local axum server standing in for the Clash Royale API,
// and shortcuts for driving the backend router.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use royale_analyzer_backend::api::{self, AppState};
use royale_analyzer_backend::config::{ClashApiConfig, Config};

pub const TEST_API_KEY: &str = "test-key";
pub const BATTLE_LOG_LEN: usize = 10;

/// A request the fake upstream received.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub uri: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeUpstream {
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl FakeUpstream {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

/// Failure the fake answers with, chosen by the requested tag.
fn scripted_failure(tag: &str) -> Option<Response> {
    let tag = tag.trim_start_matches('#');
    let (status, body) = match tag {
        "NOTFOUND" => (
            StatusCode::NOT_FOUND,
            json!({"reason": "notFound", "message": "Not found"}).to_string(),
        ),
        "BADKEY" => (
            StatusCode::UNAUTHORIZED,
            json!({"reason": "accessDenied", "message": "Invalid authorization"}).to_string(),
        ),
        "DENIED" => (
            StatusCode::FORBIDDEN,
            json!({"reason": "accessDenied.invalidIp", "message": "Invalid authorization: API key does not allow access from IP"}).to_string(),
        ),
        "BROKEN" => (StatusCode::BAD_GATEWAY, "upstream exploded".to_string()),
        _ => return None,
    };
    Some((status, body).into_response())
}

pub fn sample_battle(i: usize) -> Value {
    json!({
        "type": "PvP",
        "battleTime": format!("20240101T12{:02}00.000Z", i),
        "gameMode": {"id": 72000006, "name": "Ladder"},
        "team": [{
            "tag": "#ABC123",
            "name": "Me",
            "crowns": i % 3,
            "cards": [
                {"id": 26000000, "name": "Knight", "level": 14, "elixirCost": 3},
                {"id": 26000001, "name": "Archers", "level": 14, "elixirCost": 3},
                {"id": 28000000, "name": "Fireball", "level": 14, "elixirCost": 4},
                {"id": 26000021, "name": "Hog Rider", "level": 14, "elixirCost": 4}
            ]
        }],
        "opponent": [{
            "tag": "#OPP",
            "name": "Them",
            "crowns": 1,
            "cards": [
                {"id": 26000003, "name": "Giant", "level": 13, "elixirCost": 5},
                {"id": 28000008, "name": "Zap", "level": 13, "elixirCost": 2}
            ]
        }]
    })
}

async fn player(Path(tag): Path<String>) -> Response {
    if let Some(failure) = scripted_failure(&tag) {
        return failure;
    }
    Json(json!({
        "tag": tag,
        "name": "Test Player",
        "expLevel": 42,
        "trophies": 6000,
        "bestTrophies": 6400,
        "currentDeck": [{"name": "Knight"}]
    }))
    .into_response()
}

async fn battle_log(Path(tag): Path<String>) -> Response {
    if let Some(failure) = scripted_failure(&tag) {
        return failure;
    }
    let battles: Vec<Value> = (0..BATTLE_LOG_LEN).map(sample_battle).collect();
    Json(Value::Array(battles)).into_response()
}

async fn record(State(upstream): State<FakeUpstream>, req: Request, next: Next) -> Response {
    let seen = {
        let header = |name: axum::http::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        SeenRequest {
            uri: req.uri().to_string(),
            authorization: header(AUTHORIZATION),
            accept: header(axum::http::header::ACCEPT),
        }
    };
    upstream.seen.lock().unwrap().push(seen);
    next.run(req).await
}

/// Start the fake upstream on an ephemeral port. Returns its `/v1` base URL.
pub async fn spawn_upstream() -> (String, FakeUpstream) {
    let upstream = FakeUpstream::default();
    let app = Router::new()
        .route("/v1/players/{tag}", get(player))
        .route("/v1/players/{tag}/battlelog", get(battle_log))
        .layer(middleware::from_fn_with_state(upstream.clone(), record));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/v1"), upstream)
}

pub fn test_config(base_url: &str, api_key: Option<&str>) -> Config {
    Config {
        clash_api: ClashApiConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        },
        ..Config::default()
    }
}

/// Router wired to a fresh fake upstream.
pub async fn app_with_upstream() -> (Router, FakeUpstream) {
    let (base_url, upstream) = spawn_upstream().await;
    let state = AppState::new(test_config(&base_url, Some(TEST_API_KEY))).unwrap();
    (api::router(state), upstream)
}

/// Router with no upstream at all (nothing listens on the base URL).
pub fn offline_app(config: Config) -> Router {
    api::router(AppState::new(config).unwrap())
}

pub async fn send(app: &Router, req: axum::http::Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn fetch(app: &Router, uri: &str) -> Response {
    send(
        app,
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
}

pub async fn json_body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
