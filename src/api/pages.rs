//! Page API endpoints
//!
//! - GET    /api/v1/pages              - Paged list by sort order
//! - POST   /api/v1/pages              - Create page
//! - GET    /api/v1/pages/tree         - Nested page hierarchy
//! - GET    /api/v1/pages/slug/{slug}  - Get page by slug
//! - GET    /api/v1/pages/{id}         - Get page
//! - PATCH  /api/v1/pages/{id}         - Partial update
//! - DELETE /api/v1/pages/{id}         - Delete a page without children

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{created, Created, PaginationQuery};
use crate::api::{ApiError, AppState};
use crate::models::{PageCreate, PageResponse, PageTree, PageUpdate, PagedResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_pages).post(create_page))
        .route("/tree", get(page_tree))
        .route("/slug/{slug}", get(get_page_by_slug))
        .route("/{id}", get(get_page).patch(update_page).delete(delete_page))
}

async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PagedResult<PageResponse>>, ApiError> {
    let page = state.page_service.list(&query.params()).await?;
    Ok(Json(page.map(PageResponse::from)))
}

async fn page_tree(State(state): State<AppState>) -> Result<Json<Vec<PageTree>>, ApiError> {
    let forest = state.page_service.tree().await?;
    Ok(Json(forest.into_iter().map(PageTree::from).collect()))
}

async fn create_page(
    State(state): State<AppState>,
    Json(input): Json<PageCreate>,
) -> Result<Created<PageResponse>, ApiError> {
    Ok(created(state.page_service.create(input).await?.into()))
}

async fn get_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PageResponse>, ApiError> {
    Ok(Json(state.page_service.get(id).await?.into()))
}

async fn get_page_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageResponse>, ApiError> {
    Ok(Json(state.page_service.get_by_slug(&slug).await?.into()))
}

async fn update_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<PageUpdate>,
) -> Result<Json<PageResponse>, ApiError> {
    Ok(Json(state.page_service.update(id, input).await?.into()))
}

async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.page_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{create_user, send, test_app};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn create(app: &axum::Router, author: i64, slug: &str, parent_id: Option<i64>) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/pages",
            Some(json!({
                "title": slug,
                "slug": slug,
                "author_id": author,
                "parent_id": parent_id,
                "custom_fields": { "hero": "wide" },
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn test_page_tree_and_slug() {
        let (_pool, app) = test_app().await;
        let author = create_user(&app, "editor").await;
        let about = create(&app, author, "about", None).await;
        create(&app, author, "team", about["id"].as_i64()).await;

        let (status, body) = send(&app, "GET", "/api/v1/pages/tree", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["slug"], "about");
        assert_eq!(body[0]["children"][0]["slug"], "team");

        let (status, body) = send(&app, "GET", "/api/v1/pages/slug/team", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["custom_fields"]["hero"], "wide");
        assert_eq!(body["template"], "default");

        let (status, body) = send(&app, "GET", "/api/v1/pages?per_page=1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["total_pages"], 2);
    }

    #[tokio::test]
    async fn test_parent_delete_conflict() {
        let (_pool, app) = test_app().await;
        let author = create_user(&app, "editor").await;
        let about = create(&app, author, "about", None).await;
        let team = create(&app, author, "team", about["id"].as_i64()).await;
        let about_uri = format!("/api/v1/pages/{}", about["id"]);

        let (status, body) = send(&app, "PATCH", &about_uri, Some(json!({ "parent_id": team["id"] }))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "CIRCULAR_REFERENCE");

        let (status, _) = send(&app, "DELETE", &about_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, "DELETE", &format!("/api/v1/pages/{}", team["id"]), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "DELETE", &about_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_missing_parent_is_invalid_reference() {
        let (_pool, app) = test_app().await;
        let author = create_user(&app, "editor").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/pages",
            Some(json!({ "title": "Orphan", "slug": "orphan", "author_id": author, "parent_id": 77 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"]["field"], "parent_id");
    }
}
