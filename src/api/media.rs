//! Media library endpoints
//!
//! Records file metadata only; the bytes live wherever `url` points.
//!
//! - GET    /api/v1/media        - Paged list, newest first
//! - POST   /api/v1/media        - Register an uploaded file
//! - GET    /api/v1/media/{id}   - Get media record
//! - PATCH  /api/v1/media/{id}   - Rename or set alt text
//! - DELETE /api/v1/media/{id}   - Delete media record

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{created, Created, PaginationQuery};
use crate::api::{ApiError, AppState};
use crate::models::{MediaCreate, MediaResponse, MediaUpdate, PagedResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_media).post(create_media))
        .route("/{id}", get(get_media).patch(update_media).delete(delete_media))
}

async fn list_media(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResult<MediaResponse>>, ApiError> {
    let page = state.media_service.list(&query.params()).await?;
    Ok(Json(page.map(MediaResponse::from)))
}

async fn create_media(
    State(state): State<AppState>,
    Json(input): Json<MediaCreate>,
) -> Result<Created<MediaResponse>, ApiError> {
    Ok(created(state.media_service.create(input).await?.into()))
}

async fn get_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MediaResponse>, ApiError> {
    Ok(Json(state.media_service.get(id).await?.into()))
}

async fn update_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<MediaUpdate>,
) -> Result<Json<MediaResponse>, ApiError> {
    Ok(Json(state.media_service.update(id, input).await?.into()))
}

async fn delete_media(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.media_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
