//! Tag API endpoints
//!
//! - GET    /api/v1/tags        - All tags ordered by name
//! - POST   /api/v1/tags        - Create tag
//! - GET    /api/v1/tags/{id}   - Get tag
//! - PATCH  /api/v1/tags/{id}   - Partial update
//! - DELETE /api/v1/tags/{id}   - Delete tag and its links

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{created, Created};
use crate::api::{ApiError, AppState};
use crate::models::{TagCreate, TagResponse, TagUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag).patch(update_tag).delete(delete_tag))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = state.tag_service.list().await?;
    Ok(Json(tags.into_iter().map(Into::into).collect()))
}

async fn create_tag(
    State(state): State<AppState>,
    Json(input): Json<TagCreate>,
) -> Result<Created<TagResponse>, ApiError> {
    Ok(created(state.tag_service.create(input).await?.into()))
}

async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagResponse>, ApiError> {
    Ok(Json(state.tag_service.get(id).await?.into()))
}

async fn update_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<TagUpdate>,
) -> Result<Json<TagResponse>, ApiError> {
    Ok(Json(state.tag_service.update(id, input).await?.into()))
}

async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
