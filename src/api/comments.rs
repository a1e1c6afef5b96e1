//! Comment API endpoints
//!
//! Threads are read through `GET /api/v1/posts/{id}/comments`.
//!
//! - POST   /api/v1/comments        - Submit comment or reply (unapproved)
//! - GET    /api/v1/comments/{id}   - Get comment
//! - PATCH  /api/v1/comments/{id}   - Edit content or moderate
//! - DELETE /api/v1/comments/{id}   - Delete comment and its replies

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::common::{created, Created};
use crate::api::{ApiError, AppState};
use crate::models::{CommentCreate, CommentResponse, CommentUpdate};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_comment)).route(
        "/{id}",
        get(get_comment).patch(update_comment).delete(delete_comment),
    )
}

async fn create_comment(
    State(state): State<AppState>,
    Json(input): Json<CommentCreate>,
) -> Result<Created<CommentResponse>, ApiError> {
    Ok(created(state.comment_service.create(input).await?.into()))
}

async fn get_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CommentResponse>, ApiError> {
    Ok(Json(state.comment_service.get(id).await?.into()))
}

async fn update_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CommentUpdate>,
) -> Result<Json<CommentResponse>, ApiError> {
    Ok(Json(state.comment_service.update(id, input).await?.into()))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
