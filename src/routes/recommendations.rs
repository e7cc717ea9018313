use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{MovieSummary, RecommendationRequest, RecommendationResponse},
    routes::AppState,
    services::recommendations,
};

/// Handler for the recommendation trigger
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    if request.title.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Please select a movie title".to_string(),
        ));
    }
    let k = state.resolve_k(request.k)?;

    tracing::info!(
        request_id = %request_id,
        title = %request.title,
        k,
        "Processing recommendation request"
    );

    let (id, movies) = recommendations::recommend_by_title(
        &state.corpus,
        state.poster_provider.as_ref(),
        &request.title,
        k,
        state.settings.poster_concurrency,
    )
    .await?;

    if movies.is_empty() {
        tracing::warn!(request_id = %request_id, "No matches found for title");
    }

    Ok(Json(RecommendationResponse::new(
        MovieSummary {
            id,
            title: request.title,
        },
        movies,
    )))
}
