//! Trend Predictor
//!
//! Serves a pre-trained wellness trend classifier over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     TREND PREDICTOR                      │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐     ┌─────────────────────────────┐   │
//! │  │  HTTP (Axum) │────▶│  Inference Endpoint         │   │
//! │  │  CORS, Trace │     │  POST /predict              │   │
//! │  └──────────────┘     └──────────────┬──────────────┘   │
//! │                                      ▼                  │
//! │                       ┌─────────────────────────────┐   │
//! │                       │  Model Holder (read-only)   │   │
//! │                       │  artifact loaded at startup │   │
//! │                       └─────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod classifier;
mod config;
mod error;
mod handlers;
mod models;


use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use classifier::ModelHolder;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    init_tracing(&config);

    tracing::info!("Trend Predictor starting...");

    // The model must be in place before the listener exists
    let model = ModelHolder::load(&config.model_path, config.load_options())
        .with_context(|| format!("failed to load model from {}", config.model_path.display()))?;

    // Build application state
    let state = AppState {
        model,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("🚀 Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Trend Predictor stopped");
    Ok(())
}

fn init_tracing(config: &config::Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "trend_predictor=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub model: ModelHolder,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/model", get(handlers::model::info))
        .route("/predict", post(handlers::predict::predict))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_bytes))
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
