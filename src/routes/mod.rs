use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    error::{AppError, AppResult},
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::PosterProvider,
    store::Corpus,
};

pub mod movies;
pub mod recommendations;

/// Shared state handed to every handler
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub poster_provider: Arc<dyn PosterProvider>,
    pub settings: RecommendationSettings,
}

/// Request-independent knobs for the recommendation endpoints
#[derive(Debug, Clone, Copy)]
pub struct RecommendationSettings {
    pub default_k: usize,
    pub max_k: usize,
    pub poster_concurrency: usize,
}

impl From<&Config> for RecommendationSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_k: config.default_k,
            max_k: config.max_k,
            poster_concurrency: config.poster_concurrency,
        }
    }
}

impl AppState {
    pub fn new(
        corpus: Arc<Corpus>,
        poster_provider: Arc<dyn PosterProvider>,
        settings: RecommendationSettings,
    ) -> Self {
        Self {
            corpus,
            poster_provider,
            settings,
        }
    }

    /// Applies the default and bounds to a requested result count
    pub fn resolve_k(&self, requested: Option<usize>) -> AppResult<usize> {
        let k = requested.unwrap_or(self.settings.default_k);
        if k == 0 || k > self.settings.max_k {
            return Err(AppError::InvalidInput(format!(
                "k must be between 1 and {}, got {}",
                self.settings.max_k, k
            )));
        }
        Ok(k)
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/movies", get(movies::list))
        .route("/movies/:id/similar", get(movies::similar))
        .route("/recommendations", post(recommendations::recommend))
}

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "healthy", "movies": state.corpus.len() })),
    )
}
