//! HTTP surface of the exporter
//!
//! Three routes: the health check on `/`, the drain ingest path and the
//! Prometheus scrape path. The last two come from configuration.

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{AppError, AppResult};
use crate::metrics::{ExporterMetrics, RejectReason};
use crate::middleware::request_id_middleware;
use axum::{
    Router,
    extract::State,
    http::{Method, Uri},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod logs;
pub mod metrics;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    metrics: Arc<ExporterMetrics>,
    dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Create a fresh registry and register every metric group into it
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Metrics`] if registration fails.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let metrics = Arc::new(ExporterMetrics::new()?);
        let dispatcher = Arc::new(Dispatcher::with_default_groups(metrics.clone())?);

        Ok(Self {
            config,
            metrics,
            dispatcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics(&self) -> &ExporterMetrics {
        &self.metrics
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

/// Build the application router for `state`
pub fn router(state: AppState) -> Router {
    let server = &state.config().server;
    let metrics_path = server.metrics_path.clone();
    let logs_path = server.logs_path.clone();

    Router::new()
        .route("/", get(health::handler))
        .route(&metrics_path, get(metrics::handler).fallback(reject_method))
        .route(&logs_path, post(logs::handler).fallback(reject_method))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

/// Wrong method on the ingest or scrape path; answered with 400
async fn reject_method(State(state): State<AppState>, method: Method, uri: Uri) -> AppError {
    state.metrics().rejected_request(RejectReason::BadMethod);
    tracing::warn!(method = %method, path = %uri.path(), "Rejected request with wrong method");

    AppError::BadMethod {
        method: method.to_string(),
        path: uri.path().to_string(),
    }
}
