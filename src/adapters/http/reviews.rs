use crate::adapters::http::error::ApiError;
use crate::adapters::http::ndjson::ndjson_response;
use crate::app::review_service::ReviewService;
use crate::domain::model::Review;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

/// Routes:
/// - `POST /v1/reviews`, `GET /v1/reviews[?movieInfoId=ID]`
/// - `PUT|DELETE /v1/reviews/:id`
/// - `GET /v1/reviews/stream` (NDJSON, replays the latest review)
pub fn router(service: ReviewService) -> Router {
    Router::new()
        .route("/v1/reviews", get(get_reviews).post(add_review))
        .route("/v1/reviews/stream", get(stream))
        .route("/v1/reviews/:id", put(update_review).delete(delete_review))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewFilter {
    pub movie_info_id: Option<String>,
}

async fn add_review(
    State(service): State<ReviewService>,
    Json(review): Json<Review>,
) -> Result<(StatusCode, Json<Review>), ApiError> {
    let saved = service.add_review(review).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_reviews(
    State(service): State<ReviewService>,
    Query(filter): Query<ReviewFilter>,
) -> Result<Json<Vec<Review>>, ApiError> {
    Ok(Json(service.get_reviews(filter.movie_info_id.as_deref()).await?))
}

async fn update_review(
    State(service): State<ReviewService>,
    Path(id): Path<String>,
    Json(updated): Json<Review>,
) -> Result<Json<Review>, ApiError> {
    service
        .update_review(updated, &id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn delete_review(
    State(service): State<ReviewService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_review(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stream(State(service): State<ReviewService>) -> Response {
    ndjson_response(service.stream())
}
