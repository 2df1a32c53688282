// HTTP API routes (players, videos, reports, dashboard, language).

mod dashboard;
mod language;
mod players;
mod reports;
mod videos;

pub use videos::MAX_VIDEO_BYTES;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, services::ServeDir};

use crate::clash_api::{ClashApiError, ClashRoyaleClient, UpstreamFailure};
use crate::config::Config;
use crate::locale::{self, Locale, LocaleSettings, Message};
use crate::metrics;

// ── Shared application state ─────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when no API key is configured; player endpoints then answer 503.
    pub clash: Option<Arc<ClashRoyaleClient>>,
}

impl AppState {
    /// Build the state, constructing the Clash Royale client from the config.
    ///
    /// A missing API key is tolerated (and reported per request); any other
    /// client construction failure is returned.
    pub fn new(config: Config) -> Result<Self, ClashApiError> {
        let clash = match ClashRoyaleClient::new(&config.clash_api) {
            Ok(client) => Some(Arc::new(client)),
            Err(ClashApiError::MissingApiKey) => {
                tracing::warn!("CLASH_ROYALE_API_KEY is not set; player endpoints will return 503");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            config: Arc::new(config),
            clash,
        })
    }

    fn clash(&self) -> Result<&ClashRoyaleClient, ClashApiError> {
        self.clash.as_deref().ok_or(ClashApiError::MissingApiKey)
    }
}

impl FromRef<AppState> for LocaleSettings {
    fn from_ref(state: &AppState) -> Self {
        LocaleSettings {
            default_locale: state.config.default_locale,
            fallback_locale: state.config.fallback_locale,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────

/// Field-keyed validation messages, rendered as a 422 response.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(ValidationErrors),
    #[error("{summary}: {source}")]
    Upstream {
        summary: &'static str,
        source: ClashApiError,
        locale: Locale,
        debug: bool,
        /// Report every failure as a plain 500.
        generic: bool,
    },
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    fn upstream(summary: &'static str, source: ClashApiError, locale: Locale, debug: bool) -> Self {
        ApiError::Upstream {
            summary,
            source,
            locale,
            debug,
            generic: false,
        }
    }
}

/// Status code and localized message for an upstream failure category.
fn upstream_status(kind: UpstreamFailure) -> (StatusCode, Message) {
    match kind {
        UpstreamFailure::Configuration => (StatusCode::SERVICE_UNAVAILABLE, Message::ApiKeyMissing),
        UpstreamFailure::NotFound => (StatusCode::NOT_FOUND, Message::PlayerNotFound),
        UpstreamFailure::Unauthorized => (StatusCode::UNAUTHORIZED, Message::ApiKeyInvalid),
        UpstreamFailure::Forbidden => (StatusCode::FORBIDDEN, Message::AccessDenied),
        UpstreamFailure::Generic => (StatusCode::INTERNAL_SERVER_ERROR, Message::UpstreamFailed),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Validation failed", "errors": errors })),
            )
                .into_response(),
            ApiError::Upstream {
                summary,
                source,
                locale,
                debug,
                generic,
            } => {
                let kind = if generic {
                    UpstreamFailure::Generic
                } else {
                    source.kind()
                };
                let (status, message) = upstream_status(kind);
                tracing::warn!(status = status.as_u16(), "{summary}: {source}");
                let details = if debug {
                    Value::String(source.to_string())
                } else {
                    Value::Null
                };
                (
                    status,
                    Json(json!({
                        "message": summary,
                        "error": locale.text(message),
                        "details": details,
                    })),
                )
                    .into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "message": message }))).into_response()
            }
        }
    }
}

/// Standard success envelope: `{data, message}`.
fn data_response<T: Serialize>(data: T, message: &str) -> Json<Value> {
    Json(json!({ "data": data, "message": message }))
}

/// Parse a numeric path id, rejecting anything but a non-negative integer.
fn parse_id(field: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| {
            ApiError::Validation(ValidationErrors::single(
                field,
                format!("The {field} field must be a non-negative integer."),
            ))
        })
}

// ── Router ────────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "royale-analyzer-backend" }))
}

async fn get_metrics() -> String {
    metrics::gather_metrics()
}

pub fn router(state: AppState) -> Router {
    let locale_settings = LocaleSettings::from_ref(&state);
    let static_dir = state.config.static_dir.clone();
    let upload_limit = DefaultBodyLimit::max(videos::MAX_UPLOAD_BODY_BYTES);

    let router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(get_metrics))
        // Players
        .route("/api/players", get(players::get_player))
        .route("/api/players/battles", get(players::get_battles))
        .route("/api/players/battle", get(players::get_battle_for_analysis))
        // Dashboard
        .route("/api/dashboard/stats", get(dashboard::get_stats))
        // Videos
        .route(
            "/api/videos",
            get(videos::index)
                .post(videos::store)
                .layer(upload_limit),
        )
        .route("/api/videos/upload", post(videos::store).layer(upload_limit))
        .route("/api/videos/{id}", get(videos::show).delete(videos::destroy))
        .route("/api/videos/{id}/analyze", post(videos::analyze))
        // Reports
        .route("/api/reports", get(reports::index))
        .route("/api/reports/{video_id}", get(reports::show))
        // Language
        .route("/language/{locale}", get(language::switch));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(middleware::from_fn_with_state(
            locale_settings,
            locale::resolve_locale,
        ))
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn json_body(res: Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("id", "42").unwrap(), 42);
        assert_eq!(parse_id("id", "0").unwrap(), 0);
        assert!(parse_id("id", "-1").is_err());
        assert!(parse_id("id", "abc").is_err());
        assert!(parse_id("id", "").is_err());
    }

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.add("tag", "first");
        errors.add("tag", "second");
        errors.add("battle_index", "third");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"tag": ["first", "second"], "battle_index": ["third"]})
        );
        assert!(errors.has("tag"));
        assert!(!errors.has("title"));
    }

    #[tokio::test]
    async fn test_validation_response() {
        let res = ApiError::Validation(ValidationErrors::single("tag", "bad")).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(res).await;
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"]["tag"][0], "bad");
    }

    #[tokio::test]
    async fn test_upstream_response_status_mapping() {
        let cases = [
            (ClashApiError::MissingApiKey, StatusCode::SERVICE_UNAVAILABLE),
            (
                ClashApiError::Status { status: 404, message: "notFound".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                ClashApiError::Status { status: 401, message: "x".into() },
                StatusCode::UNAUTHORIZED,
            ),
            (
                ClashApiError::Status { status: 403, message: "x".into() },
                StatusCode::FORBIDDEN,
            ),
            (
                ClashApiError::Status { status: 502, message: "x".into() },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (source, expected) in cases {
            let res = ApiError::upstream("Failed", source, Locale::En, false).into_response();
            assert_eq!(res.status(), expected);
        }
    }

    #[tokio::test]
    async fn test_upstream_response_body_localized_and_details_gated() {
        let source = ClashApiError::Status {
            status: 404,
            message: "notFound".into(),
        };
        let res = ApiError::upstream("Failed to fetch player data", source, Locale::Ja, false)
            .into_response();
        let body = json_body(res).await;
        assert_eq!(body["message"], "Failed to fetch player data");
        assert_eq!(body["error"], Locale::Ja.text(Message::PlayerNotFound));
        assert_eq!(body["details"], Value::Null);

        let source = ClashApiError::Status {
            status: 404,
            message: "notFound".into(),
        };
        let res = ApiError::upstream("Failed", source, Locale::En, true).into_response();
        let body = json_body(res).await;
        assert_eq!(body["error"], Locale::En.text(Message::PlayerNotFound));
        assert_eq!(body["details"], "Clash Royale API error [404]: notFound");
    }

    #[tokio::test]
    async fn test_generic_upstream_always_500() {
        let res = ApiError::Upstream {
            summary: "Failed to fetch battle data",
            source: ClashApiError::Status {
                status: 404,
                message: "notFound".into(),
            },
            locale: Locale::En,
            debug: false,
            generic: true,
        }
        .into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
