use std::time::Instant;

use crate::{
    error::AppResult,
    models::{MovieId, RecommendedMovie},
    services::{
        providers::{resolve_posters, PosterProvider},
        ranker,
        title_normalizer::normalize,
    },
    store::Corpus,
};

/// Recommends movies similar to the one with the given exact title
///
/// Returns the id the title resolved to alongside the recommendations. Fails
/// with `NotFound` when no movie carries that title. Posters are resolved
/// afterwards and never cause a failure.
pub async fn recommend_by_title(
    corpus: &Corpus,
    provider: &dyn PosterProvider,
    title: &str,
    k: usize,
    poster_concurrency: usize,
) -> AppResult<(MovieId, Vec<RecommendedMovie>)> {
    let id = corpus.lookup_by_title(title)?;
    let movies = recommend_by_id(corpus, provider, id, k, poster_concurrency).await?;
    Ok((id, movies))
}

/// Recommends movies similar to the movie at `id`, decorated with posters
pub async fn recommend_by_id(
    corpus: &Corpus,
    provider: &dyn PosterProvider,
    id: MovieId,
    k: usize,
    poster_concurrency: usize,
) -> AppResult<Vec<RecommendedMovie>> {
    let start = Instant::now();

    let ranked = ranker::recommend(corpus, id, k)?;
    let ranked_in = start.elapsed();

    let titles: Vec<String> = ranked.iter().map(|r| r.title.clone()).collect();
    let posters = resolve_posters(provider, &titles, poster_concurrency).await;

    let movies: Vec<RecommendedMovie> = ranked
        .into_iter()
        .zip(posters)
        .map(|(recommendation, poster)| {
            let display_title = normalize(&recommendation.title);
            RecommendedMovie::new(recommendation, display_title, poster)
        })
        .collect();

    tracing::info!(
        query = id,
        k,
        results = movies.len(),
        rank_ms = ranked_in.as_millis() as u64,
        total_ms = start.elapsed().as_millis() as u64,
        "Recommendations ready"
    );

    Ok(movies)
}
