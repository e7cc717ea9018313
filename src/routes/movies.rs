use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{MovieId, MovieSummary, RecommendationResponse},
    routes::AppState,
    services::recommendations,
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarQuery {
    #[serde(default)]
    k: Option<usize>,
}

/// Titles for the selection control, in corpus order
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQuery>,
) -> Json<Vec<MovieSummary>> {
    let query = params.q.unwrap_or_default();
    Json(state.corpus.search_titles(&query))
}

/// Recommendations for the movie at a corpus position
pub async fn similar(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<MovieId>,
    Query(params): Query<SimilarQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = state.resolve_k(params.k)?;
    let title = state
        .corpus
        .title(id)
        .ok_or(AppError::InvalidItem(id, state.corpus.len()))?
        .to_string();

    tracing::info!(request_id = %request_id, movie_id = id, k, "Processing similar-movies request");

    let movies = recommendations::recommend_by_id(
        &state.corpus,
        state.poster_provider.as_ref(),
        id,
        k,
        state.settings.poster_concurrency,
    )
    .await?;

    Ok(Json(RecommendationResponse::new(
        MovieSummary { id, title },
        movies,
    )))
}
