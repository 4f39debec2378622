use crate::adapters::http::error::ApiError;
use crate::adapters::http::ndjson::ndjson_response;
use crate::app::movies_service::MoviesService;
use crate::domain::model::Movie;
use axum::{
    extract::{Path, State},
    response::Response,
    routing::get,
    Json, Router,
};

/// Routes:
/// - `GET /v1/movies/:id`: movie info joined with its reviews
/// - `GET /v1/movies/stream`: NDJSON pass-through of the movie info stream
pub fn router(service: MoviesService) -> Router {
    Router::new()
        .route("/v1/movies/stream", get(retrieve_movie_infos))
        .route("/v1/movies/:id", get(retrieve_movie_by_id))
        .with_state(service)
}

async fn retrieve_movie_by_id(
    State(service): State<MoviesService>,
    Path(id): Path<String>,
) -> Result<Json<Movie>, ApiError> {
    Ok(Json(service.retrieve_movie_by_id(&id).await?))
}

async fn retrieve_movie_infos(State(service): State<MoviesService>) -> Response {
    ndjson_response(service.retrieve_movie_infos())
}
