//! Loan Repayment Scoring Server
//!
//! HTTP surface over the `loan_core` prediction pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LOAN SCORING SERVER                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌───────────────┐  ┌─────────────────────┐ │
//! │  │  Routes   │  │  Upload       │  │  PredictionService  │ │
//! │  │  (Axum)   │─▶│  Staging      │─▶│  align → score →    │ │
//! │  │           │  │               │  │  log                │ │
//! │  └───────────┘  └───────────────┘  └──────────┬──────────┘ │
//! │                                               ▼            │
//! │                      ┌──────────────┐  ┌──────────────┐    │
//! │                      │  artifacts/  │  │ predictions  │    │
//! │                      │  (read-only) │  │ _log.csv     │    │
//! │                      └──────────────┘  └──────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;
mod uploads;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use loan_core::{ArtifactStore, PredictionLog, PredictionService};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt_layer(config.is_production()))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loan_server=debug,loan_core=info,tower_http=debug".into()),
        )
        .init();

    tracing::info!("Loan scoring server starting ({})", config.environment);

    let store = ArtifactStore::load(&config.artifacts_dir).with_context(|| {
        format!("failed to load artifacts from {}", config.artifacts_dir.display())
    })?;
    tracing::info!("Prediction log: {}", config.prediction_log.display());

    let service = PredictionService::new(Arc::new(store), PredictionLog::open(&config.prediction_log));

    // Build application state
    let state = AppState {
        service: Arc::new(service),
        config: config.clone(),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

/// JSON lines in production, human-readable otherwise
fn fmt_layer(json: bool) -> Box<dyn Layer<Registry> + Send + Sync> {
    if json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home::index))
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::single))
        .route("/batch", get(handlers::home::batch_page))
        .route("/predict-batch-ui", post(handlers::batch::upload))
        .route("/predict-batch", post(handlers::batch::upload))
        .route("/history", get(handlers::history::list))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
