//! Post API endpoints
//!
//! - GET    /api/v1/posts                  - Paged list, filters `status`,
//!                                           `category_id`, `tag_id`, `author_id`
//! - POST   /api/v1/posts                  - Create post with its links
//! - GET    /api/v1/posts/slug/{slug}      - Get post by slug
//! - GET    /api/v1/posts/{id}             - Get post
//! - PATCH  /api/v1/posts/{id}             - Partial update
//! - DELETE /api/v1/posts/{id}             - Delete post, links and comments
//! - POST   /api/v1/posts/{id}/view        - Count one view
//! - GET    /api/v1/posts/{id}/comments    - Threaded comments

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{created, default_page, default_per_page, Created};
use crate::api::{ApiError, AppState};
use crate::models::{
    CommentThread, ContentStatus, ListParams, PagedResult, PostCreate, PostFilter, PostResponse,
    PostUpdate,
};

/// Query parameters for listing posts
#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    pub status: Option<ContentStatus>,
    pub category_id: Option<i64>,
    pub tag_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl ListPostsQuery {
    fn filter(&self) -> PostFilter {
        PostFilter {
            status: self.status,
            category_id: self.category_id,
            tag_id: self.tag_id,
            author_id: self.author_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    #[serde(default)]
    pub approved_only: bool,
}

#[derive(Debug, Serialize)]
pub struct ViewCountResponse {
    pub id: i64,
    pub view_count: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/slug/{slug}", get(get_post_by_slug))
        .route("/{id}", get(get_post).patch(update_post).delete(delete_post))
        .route("/{id}/view", post(record_view))
        .route("/{id}/comments", get(post_comments))
}

async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<PagedResult<PostResponse>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = state.post_service.list(&query.filter(), &params).await?;
    Ok(Json(page.map(PostResponse::from)))
}

async fn create_post(
    State(state): State<AppState>,
    Json(input): Json<PostCreate>,
) -> Result<Created<PostResponse>, ApiError> {
    Ok(created(state.post_service.create(input).await?.into()))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PostResponse>, ApiError> {
    Ok(Json(state.post_service.get(id).await?.into()))
}

async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PostResponse>, ApiError> {
    Ok(Json(state.post_service.get_by_slug(&slug).await?.into()))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PostUpdate>,
) -> Result<Json<PostResponse>, ApiError> {
    Ok(Json(state.post_service.update(id, input).await?.into()))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.post_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ViewCountResponse>, ApiError> {
    let view_count = state.post_service.record_view(id).await?;
    Ok(Json(ViewCountResponse { id, view_count }))
}

async fn post_comments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<CommentThread>>, ApiError> {
    let threads = state.comment_service.thread(id, query.approved_only).await?;
    Ok(Json(threads.into_iter().map(CommentThread::from).collect()))
}
