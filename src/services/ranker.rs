use std::cmp::Ordering;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Recommendation},
    services::similarity::cosine_similarity,
    store::Corpus,
};

/// Scores every movie in the corpus against the query movie
///
/// The query itself is included, so the result has `corpus.len()` entries
/// in corpus order.
pub fn score_all(corpus: &Corpus, id: MovieId) -> AppResult<Vec<(MovieId, f32)>> {
    let query = corpus
        .vector(id)
        .ok_or(AppError::InvalidItem(id, corpus.len()))?;

    Ok(corpus
        .vectors()
        .enumerate()
        .map(|(candidate, vector)| (candidate, cosine_similarity(query, vector)))
        .collect())
}

/// Higher score first, then lower id. Total, so the result never depends on
/// sort stability.
fn rank_order(a: &(MovieId, f32), b: &(MovieId, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Returns the `k` movies most similar to `id`, excluding `id` itself
///
/// Fewer than `k` results come back when the corpus is smaller than `k + 1`.
/// Runs a dense O(N·D) scan; an approximate nearest-neighbour index would slot
/// in here for large corpora.
pub fn recommend(corpus: &Corpus, id: MovieId, k: usize) -> AppResult<Vec<Recommendation>> {
    let mut candidates = score_all(corpus, id)?;

    // Drop the query before selecting, so duplicates of it still count as
    // neighbours.
    candidates.retain(|(candidate, _)| *candidate != id);

    let k = k.min(candidates.len());
    if k == 0 {
        return Ok(Vec::new());
    }

    if k < candidates.len() {
        candidates.select_nth_unstable_by(k - 1, rank_order);
        candidates.truncate(k);
    }
    candidates.sort_unstable_by(rank_order);

    tracing::debug!(
        query = id,
        k,
        top_score = candidates.first().map(|(_, score)| *score),
        "Ranked recommendations"
    );

    Ok(candidates
        .into_iter()
        .filter_map(|(candidate, score)| {
            corpus.title(candidate).map(|title| Recommendation {
                id: candidate,
                title: title.to_string(),
                score,
            })
        })
        .collect())
}
