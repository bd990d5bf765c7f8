use district_safety_analytics::{
    api::{build_router, AppState},
    config::Config,
    dataset::{DatasetSource, JsonFileSource},
    ml::PredictionService,
    telemetry::init_tracing,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize tracing
    init_tracing(&config.observability);

    tracing::info!(
        "Starting District Safety Analytics v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Initialize Prometheus metrics
    if config.observability.prometheus_enabled {
        if let Err(e) = district_safety_analytics::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    } else {
        tracing::info!("⚠️  Prometheus metrics disabled in configuration");
    }

    // Load the dataset snapshot once; every request reads it
    let source = JsonFileSource::new(&config.dataset.path);
    let snapshot = source.load().await.map_err(|e| {
        tracing::error!("Failed to load dataset from {}: {}", source.describe(), e);
        e
    })?;
    tracing::info!("✅ Dataset snapshot loaded ({} districts)", snapshot.len());

    let service = Arc::new(PredictionService::new(config.ml.clone())?);
    tracing::info!(
        seed = service.config().seed,
        "✅ Prediction service initialized"
    );

    let state = AppState::new(snapshot, service);
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 HTTP API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
