use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Corpus load error: {0}")]
    CorpusLoad(String),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid movie id {0}: corpus has {1} movies")]
    InvalidItem(usize, usize),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) | AppError::InvalidItem(..) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::CorpusLoad(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg,
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %message, "Request failed");
        } else {
            tracing::warn!(status = %status, error = %message, "Request rejected");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Failure of a single poster lookup
///
/// Never surfaced to clients: the resolver swaps every variant for the
/// placeholder poster.
#[derive(thiserror::Error, Debug)]
pub enum PosterLookupError {
    #[error("no OMDb API key configured")]
    MissingApiKey,

    #[error("poster lookup timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(reqwest::Error),

    #[error("lookup service returned status {0}")]
    Status(u16),

    #[error("malformed lookup response: {0}")]
    Malformed(String),

    #[error("no poster available for \"{0}\"")]
    NotFound(String),
}

impl From<reqwest::Error> for PosterLookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            PosterLookupError::Timeout
        } else if err.is_decode() {
            PosterLookupError::Malformed(err.to_string())
        } else {
            PosterLookupError::Transport(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("Unknown movie".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_item_maps_to_404() {
        let response = AppError::InvalidItem(12, 4).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let response = AppError::InvalidInput("k must be positive".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_corpus_load_maps_to_500() {
        let response = AppError::CorpusLoad("missing file".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_item_message() {
        let err = AppError::InvalidItem(7, 3);
        assert_eq!(err.to_string(), "Invalid movie id 7: corpus has 3 movies");
    }
}
