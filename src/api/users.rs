//! User API endpoints
//!
//! - GET    /api/v1/users         - Paged user list
//! - POST   /api/v1/users         - Create user
//! - GET    /api/v1/users/{id}    - Get user
//! - PATCH  /api/v1/users/{id}    - Partial update
//! - DELETE /api/v1/users/{id}    - Delete user without owned content
//! - POST   /api/v1/auth/login    - Verify credentials

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::common::{created, Created, PaginationQuery};
use crate::api::{ApiError, AppState};
use crate::models::{PagedResult, UserCreate, UserLogin, UserResponse, UserUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).patch(update_user).delete(delete_user))
}

pub fn auth_router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResult<UserResponse>>, ApiError> {
    let page = state.user_service.list(&query.params()).await?;
    Ok(Json(page.map(UserResponse::from)))
}

async fn create_user(
    State(state): State<AppState>,
    Json(input): Json<UserCreate>,
) -> Result<Created<UserResponse>, ApiError> {
    let user = state.user_service.create(input).await?;
    Ok(created(user.into()))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.user_service.get(id).await?.into()))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.user_service.update(id, input).await?.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<UserLogin>,
) -> Result<Json<UserResponse>, ApiError> {
    Ok(Json(state.user_service.authenticate(input).await?.into()))
}
