use royale_analyzer_backend::{api, config::Config, metrics};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load();
    let port = config.port;
    if config.debug {
        tracing::warn!("Debug mode enabled: error responses include raw details");
    }

    metrics::register_metrics();

    let state = api::AppState::new(config).expect("Failed to initialize Clash Royale client");
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to port {port}: {e}"));

    tracing::info!("Royale analyzer backend listening on port {port}");
    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
