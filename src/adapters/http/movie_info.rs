use crate::adapters::http::error::ApiError;
use crate::adapters::http::ndjson::ndjson_response;
use crate::app::movie_info_service::MovieInfoService;
use crate::domain::model::MovieInfo;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Routes:
/// - `POST /v1/movieinfos`, `GET /v1/movieinfos[?year=N]`
/// - `GET|PUT|DELETE /v1/movieinfos/:id`
/// - `GET /v1/movieinfos/stream` (NDJSON, replays every created movie info)
pub fn router(service: MovieInfoService) -> Router {
    Router::new()
        .route("/v1/movieinfos", get(get_all_movie_infos).post(add_movie_info))
        .route("/v1/movieinfos/stream", get(stream))
        .route(
            "/v1/movieinfos/:id",
            get(get_movie_info_by_id)
                .put(update_movie_info)
                .delete(delete_movie_info),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct YearFilter {
    pub year: Option<i32>,
}

async fn add_movie_info(
    State(service): State<MovieInfoService>,
    Json(movie_info): Json<MovieInfo>,
) -> Result<(StatusCode, Json<MovieInfo>), ApiError> {
    let saved = service.add_movie_info(movie_info).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn get_all_movie_infos(
    State(service): State<MovieInfoService>,
    Query(filter): Query<YearFilter>,
) -> Result<Json<Vec<MovieInfo>>, ApiError> {
    let movie_infos = match filter.year {
        Some(year) => service.get_movie_infos_by_year(year).await?,
        None => service.get_all_movie_infos().await?,
    };
    Ok(Json(movie_infos))
}

async fn get_movie_info_by_id(
    State(service): State<MovieInfoService>,
    Path(id): Path<String>,
) -> Result<Json<MovieInfo>, ApiError> {
    service
        .get_movie_info_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn update_movie_info(
    State(service): State<MovieInfoService>,
    Path(id): Path<String>,
    Json(updated): Json<MovieInfo>,
) -> Result<Json<MovieInfo>, ApiError> {
    service
        .update_movie_info(updated, &id)
        .await?
        .map(Json)
        .ok_or_else(ApiError::not_found)
}

async fn delete_movie_info(
    State(service): State<MovieInfoService>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    service.delete_movie_info(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn stream(State(service): State<MovieInfoService>) -> Response {
    ndjson_response(service.stream())
}
