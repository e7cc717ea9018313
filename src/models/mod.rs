use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a movie in the corpus; the only identifier the engine uses
pub type MovieId = usize;

/// Fixed image shown whenever a poster cannot be resolved
pub const PLACEHOLDER_POSTER_URL: &str =
    "https://via.placeholder.com/500x750?text=Poster+Unavailable";

/// A movie record as stored in the corpus artifact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub title: String,
    /// External catalogue id (e.g. MovieLens); carried through, never ranked on
    #[serde(default)]
    pub movie_id: Option<i64>,
}

/// Entry in the selection list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
}

/// One ranked neighbour of the query movie
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub id: MovieId,
    pub title: String,
    pub score: f32,
}

/// Outcome of resolving a poster for one movie
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poster {
    Found(String),
    Placeholder,
}

impl Poster {
    pub fn url(&self) -> &str {
        match self {
            Poster::Found(url) => url,
            Poster::Placeholder => PLACEHOLDER_POSTER_URL,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Poster::Found(_))
    }
}

/// A recommendation decorated with its poster, ready for display
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendedMovie {
    pub id: MovieId,
    pub title: String,
    pub display_title: String,
    pub score: f32,
    pub poster_url: String,
    pub poster_found: bool,
}

impl RecommendedMovie {
    pub fn new(recommendation: Recommendation, display_title: String, poster: Poster) -> Self {
        Self {
            id: recommendation.id,
            title: recommendation.title,
            display_title,
            score: recommendation.score,
            poster_url: poster.url().to_string(),
            poster_found: poster.is_found(),
        }
    }
}

/// Request body for the recommendation trigger
#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub title: String,
    #[serde(default)]
    pub k: Option<usize>,
}

/// Recommendations laid out for the poster grid
#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub selected: MovieSummary,
    pub recommendations: Vec<RecommendedMovie>,
    /// Rows of at most `GRID_COLUMNS` movies, in rank order
    pub grid: Vec<Vec<RecommendedMovie>>,
}

pub const GRID_COLUMNS: usize = 5;

impl RecommendationResponse {
    pub fn new(selected: MovieSummary, recommendations: Vec<RecommendedMovie>) -> Self {
        let grid = recommendations
            .chunks(GRID_COLUMNS)
            .map(|row| row.to_vec())
            .collect();

        Self {
            selected,
            recommendations,
            grid,
        }
    }
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// Raw response from the OMDb title lookup (`?t=`)
///
/// OMDb reports failures in-band: `Response` is the string `"False"` and
/// `Error` explains why, while HTTP status stays 200.
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbTitleResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "Poster", default)]
    pub poster: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

impl OmdbTitleResponse {
    /// The poster URL, if the lookup succeeded and OMDb has one
    pub fn poster_url(&self) -> Option<&str> {
        if self.response != "True" {
            return None;
        }
        self.poster
            .as_deref()
            .filter(|poster| !poster.is_empty() && *poster != "N/A")
    }
}

/// Poster URL as stored in the Redis cache
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CachedPoster {
    pub url: String,
    pub cached_at: DateTime<Utc>,
}
