use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use httpmock::prelude::*;
use movies_gateway::adapters::clients::{MovieInfoClient, ReviewsClient};
use movies_gateway::adapters::http;
use movies_gateway::app::movies_service::MoviesService;
use movies_gateway::core::client::DownstreamClient;
use movies_gateway::RetrySpec;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn fast_retry() -> RetrySpec {
    RetrySpec::builder()
        .max_attempts(4)
        .base_delay(Duration::from_millis(5))
        .build()
}

fn gateway(server: &MockServer) -> Router {
    gateway_with(&server.url("/v1/movieinfos"), &server.url("/v1/reviews"))
}

fn gateway_with(movie_info_url: &str, reviews_url: &str) -> Router {
    let timeout = Duration::from_secs(2);
    let movie_info =
        DownstreamClient::new("movie info", movie_info_url, fast_retry(), timeout).unwrap();
    let reviews = DownstreamClient::new("reviews", reviews_url, fast_retry(), timeout).unwrap();

    let service = MoviesService::new(MovieInfoClient::new(movie_info), ReviewsClient::new(reviews));
    http::with_common_routes(http::movies::router(service))
}

async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn dark_knight_rises() -> Value {
    json!({
        "movieInfoId": "abc",
        "name": "Dark Knight Rises",
        "year": 2012,
        "cast": ["Christian Bale", "Tom Hardy"],
        "release_date": "2012-07-20"
    })
}

#[tokio::test]
async fn test_movie_joined_with_reviews() {
    let server = MockServer::start();
    let info_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/abc");
        then.status(200).json_body(dark_knight_rises());
    });
    let reviews_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/reviews")
            .query_param("movieInfoId", "abc");
        then.status(200).json_body(json!([
            {"reviewId": "1", "movieInfoId": "abc", "comment": "Awesome Movie", "rating": 9.0},
            {"reviewId": "2", "movieInfoId": "abc", "comment": "Excellent Movie", "rating": 8.0}
        ]));
    });

    let (status, body) = get(gateway(&server), "/v1/movies/abc").await;

    assert_eq!(status, StatusCode::OK);
    let movie: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(movie["movieInfo"]["name"], "Dark Knight Rises");
    assert_eq!(movie["movieInfo"]["release_date"], "2012-07-20");
    assert_eq!(movie["reviewList"].as_array().unwrap().len(), 2);
    assert_eq!(movie["reviewList"][0]["comment"], "Awesome Movie");
    info_mock.assert();
    reviews_mock.assert();
}

#[tokio::test]
async fn test_unknown_movie_is_not_found() {
    let server = MockServer::start();
    let info_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/missing");
        then.status(404);
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/reviews");
        then.status(200).json_body(json!([]));
    });

    let (status, body) = get(gateway(&server), "/v1/movies/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "There is no movie info available for passed in id: missing");
    info_mock.assert_hits(1);
}

#[tokio::test]
async fn test_missing_reviews_yield_empty_list() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/abc");
        then.status(200).json_body(dark_knight_rises());
    });
    let reviews_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/reviews");
        then.status(404);
    });

    let (status, body) = get(gateway(&server), "/v1/movies/abc").await;

    assert_eq!(status, StatusCode::OK);
    let movie: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(movie["reviewList"], json!([]));
    reviews_mock.assert_hits(1);
}

#[tokio::test]
async fn test_reviews_outage_fails_after_retries() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/abc");
        then.status(200).json_body(dark_knight_rises());
    });
    let reviews_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/reviews");
        then.status(500).body("Reviews Service Unavailable");
    });

    let (status, body) = get(gateway(&server), "/v1/movies/abc").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "Reviews Service Unavailable");
    reviews_mock.assert_hits(4);
}

#[tokio::test]
async fn test_movie_info_outage_fails_after_retries() {
    let server = MockServer::start();
    let info_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/abc");
        then.status(500).body("MovieInfo Service Unavailable");
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/reviews");
        then.status(200).json_body(json!([]));
    });

    let (status, body) = get(gateway(&server), "/v1/movies/abc").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "MovieInfo Service Unavailable");
    info_mock.assert_hits(4);
}

/// Movie info upstream that answers 500 `failures` times before recovering.
async fn flaky_movie_info(failures: u32) -> (String, Arc<AtomicU32>) {
    use axum::{extract::State, routing::get, Json};

    let hits = Arc::new(AtomicU32::new(0));
    let router = Router::new()
        .route(
            "/v1/movieinfos/:id",
            get(move |State(hits): State<Arc<AtomicU32>>| async move {
                if hits.fetch_add(1, Ordering::SeqCst) < failures {
                    Err((StatusCode::INTERNAL_SERVER_ERROR, "MovieInfo Service Unavailable"))
                } else {
                    Ok(Json(dark_knight_rises()))
                }
            }),
        )
        .with_state(Arc::clone(&hits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}/v1/movieinfos", address), hits)
}

#[tokio::test]
async fn test_movie_info_recovers_within_retry_budget() {
    let server = MockServer::start();
    let reviews_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/v1/reviews")
            .query_param("movieInfoId", "abc");
        then.status(200).json_body(json!([
            {"reviewId": "1", "movieInfoId": "abc", "comment": "Awesome Movie", "rating": 9.0}
        ]));
    });
    let (movie_info_url, hits) = flaky_movie_info(3).await;

    let router = gateway_with(&movie_info_url, &server.url("/v1/reviews"));
    let (status, body) = get(router, "/v1/movies/abc").await;

    assert_eq!(status, StatusCode::OK);
    let movie: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(movie["movieInfo"]["name"], "Dark Knight Rises");
    assert_eq!(movie["reviewList"].as_array().unwrap().len(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 4);
    reviews_mock.assert_hits(1);
}

#[tokio::test]
async fn test_movie_info_client_error_is_not_retried() {
    let server = MockServer::start();
    let info_mock = server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/abc");
        then.status(400).body("movie id is malformed");
    });
    server.mock(|when, then| {
        when.method(GET).path("/v1/reviews");
        then.status(200).json_body(json!([]));
    });

    let (status, body) = get(gateway(&server), "/v1/movies/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "movie id is malformed");
    info_mock.assert_hits(1);
}

#[tokio::test]
async fn test_stream_passes_movie_infos_through() {
    let server = MockServer::start();
    let first = dark_knight_rises();
    let second = json!({
        "movieInfoId": "def",
        "name": "Batman Begins",
        "year": 2005,
        "cast": ["Christian Bale", "Michael Caine"],
        "release_date": "2005-06-15"
    });
    let ndjson = format!("{}\n{}\n", first, second);
    server.mock(|when, then| {
        when.method(GET).path("/v1/movieinfos/stream");
        then.status(200)
            .header("Content-Type", "application/x-ndjson")
            .body(ndjson);
    });

    let (status, body) = get(gateway(&server), "/v1/movies/stream").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<String> = body
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap()["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Dark Knight Rises", "Batman Begins"]);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start();
    let (status, body) = get(gateway(&server), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}
