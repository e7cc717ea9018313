use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use movie_matcher::{
    error::PosterLookupError,
    middleware::request_id::REQUEST_ID_HEADER,
    models::{MovieRecord, PLACEHOLDER_POSTER_URL},
    routes::{create_router, AppState, RecommendationSettings},
    services::PosterProvider,
    store::Corpus,
};

/// Poster provider that knows a fixed set of titles
#[derive(Clone)]
struct FixedPosters;

#[async_trait::async_trait]
impl PosterProvider for FixedPosters {
    async fn fetch_poster(&self, title: &str) -> Result<String, PosterLookupError> {
        match title {
            "Toy Story 2" => Ok("https://img.example/toy_story_2.jpg".to_string()),
            "The Avengers" => Ok("https://img.example/avengers.jpg".to_string()),
            _ => Err(PosterLookupError::NotFound(title.to_string())),
        }
    }

    fn clone_for_task(&self) -> Box<dyn PosterProvider> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

fn create_test_app() -> Router {
    let titles = [
        "Toy Story (1995)",
        "Toy Story 2 (1999)",
        "Heat (1995)",
        "Avengers, The (2012)",
    ];
    let records = titles
        .iter()
        .map(|title| MovieRecord {
            title: title.to_string(),
            movie_id: None,
        })
        .collect();
    let vectors = vec![
        vec![1.0, 0.0],
        vec![1.0, 0.0],
        vec![0.0, 1.0],
        vec![0.9, 0.1],
    ];
    let corpus = Corpus::from_parts(records, vectors).unwrap();

    let state = AppState::new(
        Arc::new(corpus),
        Arc::new(FixedPosters),
        RecommendationSettings {
            default_k: 10,
            max_k: 20,
            poster_concurrency: 2,
        },
    );
    create_router(Arc::new(state))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn titles(body: &Value) -> Vec<&str> {
    body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|movie| movie["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let (status, body) = send(create_test_app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["movies"], 4);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let id = "5f0c6b4e-8a63-4c1e-9d7a-2b1f3f1a9c11";
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, id)
        .body(Body::empty())
        .unwrap();

    let response = create_test_app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[REQUEST_ID_HEADER], id);
}

#[tokio::test]
async fn test_list_movies() {
    let (status, body) = send(create_test_app(), get("/api/v1/movies")).await;
    assert_eq!(status, StatusCode::OK);

    let movies = body.as_array().unwrap();
    assert_eq!(movies.len(), 4);
    assert_eq!(movies[0], json!({ "id": 0, "title": "Toy Story (1995)" }));
}

#[tokio::test]
async fn test_list_movies_filtered() {
    let (status, body) = send(create_test_app(), get("/api/v1/movies?q=toy")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_recommend_by_title() {
    let request = post_json(
        "/api/v1/recommendations",
        json!({ "title": "Toy Story (1995)", "k": 2 }),
    );
    let (status, body) = send(create_test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"]["id"], 0);
    assert_eq!(titles(&body), vec!["Toy Story 2 (1999)", "Avengers, The (2012)"]);
    assert_eq!(body["recommendations"][0]["display_title"], "Toy Story 2");
    assert_eq!(
        body["recommendations"][1]["poster_url"],
        "https://img.example/avengers.jpg"
    );
}

#[tokio::test]
async fn test_recommend_uses_default_k_and_placeholders() {
    let request = post_json("/api/v1/recommendations", json!({ "title": "Heat (1995)" }));
    let (status, body) = send(create_test_app(), request).await;

    assert_eq!(status, StatusCode::OK);
    // Only three other movies exist
    assert_eq!(body["recommendations"].as_array().unwrap().len(), 3);
    assert!(!titles(&body).contains(&"Heat (1995)"));
    assert_eq!(body["grid"].as_array().unwrap().len(), 1);

    let toy_story = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .find(|movie| movie["title"] == "Toy Story (1995)")
        .unwrap();
    assert_eq!(toy_story["poster_url"], PLACEHOLDER_POSTER_URL);
    assert_eq!(toy_story["poster_found"], false);
}

#[tokio::test]
async fn test_recommend_unknown_title() {
    let request = post_json(
        "/api/v1/recommendations",
        json!({ "title": "Jumanji (1995)" }),
    );
    let (status, body) = send(create_test_app(), request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("Jumanji"));
}

#[tokio::test]
async fn test_recommend_empty_title() {
    let request = post_json("/api/v1/recommendations", json!({ "title": "  " }));
    let (status, body) = send(create_test_app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_recommend_k_out_of_range() {
    let request = post_json(
        "/api/v1/recommendations",
        json!({ "title": "Heat (1995)", "k": 0 }),
    );
    let (status, _) = send(create_test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let request = post_json(
        "/api/v1/recommendations",
        json!({ "title": "Heat (1995)", "k": 21 }),
    );
    let (status, _) = send(create_test_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_similar_by_id() {
    let (status, body) = send(create_test_app(), get("/api/v1/movies/1/similar?k=1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected"]["title"], "Toy Story 2 (1999)");
    assert_eq!(titles(&body), vec!["Toy Story (1995)"]);
}

#[tokio::test]
async fn test_similar_invalid_id() {
    let (status, body) = send(create_test_app(), get("/api/v1/movies/4/similar")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
