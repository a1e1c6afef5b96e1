//! Category API endpoints
//!
//! - GET    /api/v1/categories        - Flat list ordered by name
//! - POST   /api/v1/categories        - Create category
//! - GET    /api/v1/categories/tree   - Nested hierarchy
//! - GET    /api/v1/categories/{id}   - Get category
//! - PATCH  /api/v1/categories/{id}   - Partial update (re-parenting included)
//! - DELETE /api/v1/categories/{id}   - Delete a leaf category

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::common::{created, Created};
use crate::api::{ApiError, AppState};
use crate::models::{CategoryCreate, CategoryResponse, CategoryTree, CategoryUpdate};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/tree", get(category_tree))
        .route(
            "/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = state.category_service.list().await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

async fn category_tree(State(state): State<AppState>) -> Result<Json<Vec<CategoryTree>>, ApiError> {
    let forest = state.category_service.tree().await?;
    Ok(Json(forest.into_iter().map(CategoryTree::from).collect()))
}

async fn create_category(
    State(state): State<AppState>,
    Json(input): Json<CategoryCreate>,
) -> Result<Created<CategoryResponse>, ApiError> {
    Ok(created(state.category_service.create(input).await?.into()))
}

async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CategoryResponse>, ApiError> {
    Ok(Json(state.category_service.get(id).await?.into()))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CategoryUpdate>,
) -> Result<Json<CategoryResponse>, ApiError> {
    Ok(Json(state.category_service.update(id, input).await?.into()))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.category_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{create_user, send, test_app};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    async fn create(app: &axum::Router, curator: i64, name: &str, parent_id: Option<i64>) -> Value {
        let (status, body) = send(
            app,
            "POST",
            "/api/v1/categories",
            Some(json!({
                "name": name,
                "slug": name.to_lowercase(),
                "parent_id": parent_id,
                "created_by_id": curator,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body
    }

    #[tokio::test]
    async fn test_tree_endpoint() {
        let (_pool, app) = test_app().await;
        let curator = create_user(&app, "curator").await;
        let tech = create(&app, curator, "Tech", None).await;
        assert_eq!(tech["created_by_id"], curator);
        create(&app, curator, "Rust", tech["id"].as_i64()).await;

        let (status, body) = send(&app, "GET", "/api/v1/categories/tree", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Tech");
        assert_eq!(body[0]["children"][0]["name"], "Rust");
        assert_eq!(body[0]["children"][0]["children"], json!([]));
    }

    #[tokio::test]
    async fn test_cycle_and_delete_conflicts() {
        let (_pool, app) = test_app().await;
        let curator = create_user(&app, "curator").await;
        let parent = create(&app, curator, "Parent", None).await;
        let child = create(&app, curator, "Child", parent["id"].as_i64()).await;
        let parent_uri = format!("/api/v1/categories/{}", parent["id"]);

        let (status, body) = send(
            &app,
            "PATCH",
            &parent_uri,
            Some(json!({ "parent_id": child["id"] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "CIRCULAR_REFERENCE");

        let (status, body) = send(&app, "DELETE", &parent_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "CONFLICT");

        // Explicit null moves the child to the root, then the parent can go
        let child_uri = format!("/api/v1/categories/{}", child["id"]);
        let (status, body) = send(&app, "PATCH", &child_uri, Some(json!({ "parent_id": null }))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["parent_id"].is_null());

        let (status, _) = send(&app, "DELETE", &parent_uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_invalid_slug_is_validation_error() {
        let (_pool, app) = test_app().await;
        let curator = create_user(&app, "curator").await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/categories",
            Some(json!({ "name": "Bad", "slug": "Not A Slug", "created_by_id": curator })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "slug");
    }

    #[tokio::test]
    async fn test_creator_must_exist_and_keeps_account() {
        let (_pool, app) = test_app().await;
        let curator = create_user(&app, "curator").await;

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/categories",
            Some(json!({ "name": "News", "slug": "news", "created_by_id": curator + 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"]["field"], "created_by_id");

        create(&app, curator, "News", None).await;
        let (status, _) = send(&app, "DELETE", &format!("/api/v1/users/{}", curator), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
