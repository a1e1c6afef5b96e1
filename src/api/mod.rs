//! API layer - HTTP handlers and routing
//!
//! JSON endpoints under `/api/v1`, one module per resource:
//! - users and login
//! - categories and tags
//! - posts (with views and comment threads)
//! - pages, comments and media

pub mod categories;
pub mod comments;
pub mod common;
pub mod error;
pub mod media;
pub mod pages;
pub mod posts;
pub mod tags;
pub mod users;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::MediaConfig;
use crate::db::repositories::{
    SqlxCategoryRepository, SqlxCommentRepository, SqlxMediaRepository, SqlxPageRepository,
    SqlxPostRepository, SqlxTagRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    CategoryService, CommentService, MediaService, PageService, PostService, TagService,
    UserService,
};

pub use error::ApiError;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub category_service: Arc<CategoryService>,
    pub tag_service: Arc<TagService>,
    pub post_service: Arc<PostService>,
    pub page_service: Arc<PageService>,
    pub comment_service: Arc<CommentService>,
    pub media_service: Arc<MediaService>,
}

impl AppState {
    /// Wire every service to SQLx repositories on `pool`
    pub fn new(pool: DynDatabasePool, media: MediaConfig) -> Self {
        let users = SqlxUserRepository::boxed(pool.clone());
        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let tags = SqlxTagRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool.clone());
        let pages = SqlxPageRepository::boxed(pool.clone());
        let comments = SqlxCommentRepository::boxed(pool.clone());
        let media_repo = SqlxMediaRepository::boxed(pool);

        Self {
            user_service: Arc::new(UserService::new(users.clone())),
            category_service: Arc::new(CategoryService::new(categories.clone(), users.clone())),
            tag_service: Arc::new(TagService::new(tags.clone())),
            post_service: Arc::new(PostService::new(
                posts.clone(),
                users.clone(),
                categories.clone(),
                tags.clone(),
            )),
            page_service: Arc::new(PageService::new(pages, users.clone(), categories, tags)),
            comment_service: Arc::new(CommentService::new(comments, posts)),
            media_service: Arc::new(MediaService::new(media_repo, users, media)),
        }
    }
}

/// Build the `/api/v1` routes
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/auth", users::auth_router())
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .nest("/posts", posts::router())
        .nest("/pages", pages::router())
        .nest("/comments", comments::router())
        .nest("/media", media::router())
}

/// Build the complete router with CORS and request tracing.
///
/// `cors_origin` is a single origin, or `*` for any.
pub fn build_router(state: AppState, cors_origin: &str) -> anyhow::Result<Router> {
    let origin = if cors_origin == "*" {
        AllowOrigin::any()
    } else {
        let value = cors_origin
            .parse::<HeaderValue>()
            .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;
        AllowOrigin::exact(value)
    };

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(Router::new()
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
