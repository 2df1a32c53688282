// Prometheus metrics definitions for the analyzer backend.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ── Counters ─────────────────────────────────────────────────────

    /// Total API requests, by method/endpoint/status.
    pub static ref API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("royale_api_requests_total", "Total API requests"),
        &["method", "endpoint", "status"],
    )
    .unwrap();

    /// Outbound Clash Royale API calls, by operation and upstream status.
    pub static ref CLASH_API_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "royale_clash_api_requests_total",
            "Outbound Clash Royale API requests",
        ),
        &["operation", "status"],
    )
    .unwrap();

    /// Video uploads accepted, by file extension.
    pub static ref VIDEO_UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("royale_video_uploads_total", "Accepted video uploads"),
        &["format"],
    )
    .unwrap();

    // ── Histograms ───────────────────────────────────────────────────

    /// API request duration in seconds, by endpoint.
    pub static ref API_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "royale_api_request_duration_seconds",
            "API request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0]),
        &["endpoint"],
    )
    .unwrap();
}

/// Register all metrics with the custom registry. Call once at startup.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(API_REQUESTS_TOTAL.clone()),
        Box::new(CLASH_API_REQUESTS_TOTAL.clone()),
        Box::new(VIDEO_UPLOADS_TOTAL.clone()),
        Box::new(API_REQUEST_DURATION_SECONDS.clone()),
    ];

    for c in collectors {
        if let Err(e) = REGISTRY.register(c) {
            tracing::warn!("Failed to register metric: {e}");
        }
    }
}

/// Serialize all registered metrics to the Prometheus text exposition format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {e}");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Endpoint label for requests no route matched (404s, static files).
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Endpoint label for a request: the route template it matched, so label
/// values stay bounded no matter what paths clients send.
pub fn endpoint_label(req: &Request) -> String {
    req.extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string())
}

/// Middleware recording request counts and latency.
pub async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let endpoint = endpoint_label(&req);
    let started = Instant::now();

    let response = next.run(req).await;

    API_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint.as_str()])
        .observe(started.elapsed().as_secs_f64());
    API_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), endpoint.as_str(), response.status().as_str()])
        .inc();
    response
}
