//! Post service
//!
//! Posts reference an author, any number of categories and any number of
//! tags. Every reference is checked before the write, and the repository
//! stores the post and its links in one transaction.

use crate::db::repositories::{
    CategoryRepository, ConstraintViolation, PostRepository, TagRepository, UserRepository,
};
use crate::models::{ListParams, PagedResult, Post, PostCreate, PostFilter, PostUpdate};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::reject_missing;
use chrono::Utc;
use std::sync::Arc;

const ENTITY: &str = "Post";

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
    ) -> Self {
        Self {
            posts,
            users,
            categories,
            tags,
        }
    }

    pub async fn create(&self, input: PostCreate) -> ServiceResult<Post> {
        input.validate()?;

        if self.posts.exists_by_slug(&input.slug).await? {
            return Err(ServiceError::duplicate(ENTITY, "slug", input.slug));
        }

        let post = Post::new(input);
        self.check_references(&post).await?;

        let created = match self.posts.create(&post).await {
            Ok(created) => created,
            Err(err) => return Err(self.write_failed(err, &post).await),
        };
        tracing::debug!("Created post {} ({})", created.slug, created.id);
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Post> {
        self.posts
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Post> {
        self.posts
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, slug))
    }

    /// Newest first
    pub async fn list(&self, filter: &PostFilter, params: &ListParams) -> ServiceResult<PagedResult<Post>> {
        let (posts, total) = self.posts.list(filter, params).await?;
        Ok(PagedResult::new(posts, total, params))
    }

    /// Apply a partial update. A supplied `category_ids` or `tag_ids`
    /// replaces that whole link set.
    pub async fn update(&self, id: i64, input: PostUpdate) -> ServiceResult<Post> {
        input.validate()?;
        let mut post = self.get(id).await?;

        if let Some(ref slug) = input.slug {
            if self.posts.exists_by_slug_excluding(slug, id).await? {
                return Err(ServiceError::duplicate(ENTITY, "slug", slug.clone()));
            }
        }

        input.apply_to(&mut post, Utc::now());
        self.check_links(&post.category_ids, &post.tag_ids).await?;

        let updated = match self.posts.update(&post).await {
            Ok(updated) => updated,
            Err(err) => return Err(self.write_failed(err, &post).await),
        };
        tracing::debug!("Updated post {}", id);
        Ok(updated)
    }

    /// Delete a post with its links and comments
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.posts.delete(id).await?;
        tracing::info!("Deleted post {}", id);
        Ok(())
    }

    /// Count one view; returns the new total
    pub async fn record_view(&self, id: i64) -> ServiceResult<i64> {
        self.posts
            .increment_view_count(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    async fn check_references(&self, post: &Post) -> ServiceResult<()> {
        if self.users.get_by_id(post.author_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "author_id",
                id: post.author_id,
            });
        }
        self.check_links(&post.category_ids, &post.tag_ids).await
    }

    async fn check_links(&self, category_ids: &[i64], tag_ids: &[i64]) -> ServiceResult<()> {
        reject_missing("category_ids", self.categories.missing_ids(category_ids).await?)?;
        reject_missing("tag_ids", self.tags.missing_ids(tag_ids).await?)
    }

    /// A foreign key failure means a linked row was deleted after the
    /// checks; repeating them names the reference.
    async fn write_failed(&self, err: anyhow::Error, post: &Post) -> ServiceError {
        if ConstraintViolation::find(&err) == Some(ConstraintViolation::ForeignKey) {
            if let Err(reference) = self.check_references(post).await {
                return reference;
            }
        }
        ServiceError::from_write(ENTITY, err, &[("slug", post.slug.as_str())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCategoryRepository, SqlxPostRepository, SqlxTagRepository, SqlxUserRepository,
    };
    use crate::db::test_support::{migrated_pool, seed_category, seed_tag, seed_user};
    use crate::db::DynDatabasePool;
    use crate::models::{ContentStatus, Patch};
    use sqlx::Row;

    async fn setup_test_service() -> (DynDatabasePool, PostService, i64) {
        let pool = migrated_pool().await;
        let author = seed_user(&pool, "writer").await;
        let service = PostService::new(
            SqlxPostRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxTagRepository::boxed(pool.clone()),
        );
        (pool, service, author)
    }

    #[tokio::test]
    async fn test_create_preserves_every_field() {
        let (pool, service, author) = setup_test_service().await;
        let news = seed_category(&pool, "news", None).await;
        let rust = seed_tag(&pool, "rust").await;

        let mut input = PostCreate::new("Hello", "hello", author);
        input.excerpt = "Short".to_string();
        input.content = "Long body".to_string();
        input.featured_image_url = Some("/img/hero.png".to_string());
        input.status = ContentStatus::Published;
        input.is_featured = true;
        input.category_ids = vec![news];
        input.tag_ids = vec![rust];
        input.meta_title = Some("Hello | Blog".to_string());
        input.seo_keywords = vec!["greeting".to_string()];

        let created = service.create(input).await.unwrap();
        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.excerpt, "Short");
        assert_eq!(fetched.featured_image_url.as_deref(), Some("/img/hero.png"));
        assert!(fetched.is_featured);
        assert!(fetched.published_at.is_some());
        assert_eq!(fetched.category_ids, vec![news]);
        assert_eq!(fetched.tag_ids, vec![rust]);
        assert_eq!(fetched.seo_keywords, vec!["greeting"]);
    }

    #[tokio::test]
    async fn test_missing_tag_fails_whole_create() {
        let (pool, service, author) = setup_test_service().await;
        let rust = seed_tag(&pool, "rust").await;

        let mut input = PostCreate::new("Hello", "hello", author);
        input.tag_ids = vec![rust, rust + 1];
        let err = service.create(input).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::InvalidReference { field: "tag_ids", id } if id == rust + 1
        ));

        let posts: i64 = sqlx::query("SELECT COUNT(*) AS count FROM posts")
            .fetch_one(pool.sqlite())
            .await
            .unwrap()
            .get("count");
        assert_eq!(posts, 0);
    }

    #[tokio::test]
    async fn test_unknown_author_and_category() {
        let (_pool, service, author) = setup_test_service().await;

        let err = service
            .create(PostCreate::new("Hello", "hello", author + 50))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidReference { field: "author_id", .. }));

        let mut input = PostCreate::new("Hello", "hello", author);
        input.category_ids = vec![9];
        let err = service.create(input).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidReference { field: "category_ids", id: 9 }));
    }

    #[tokio::test]
    async fn test_published_on_create_shares_creation_time() {
        let (_pool, service, author) = setup_test_service().await;
        let mut input = PostCreate::new("Hello", "hello", author);
        input.status = ContentStatus::Published;

        let created = service.create(input).await.unwrap();
        assert_eq!(created.published_at, Some(created.created_at));
        assert_eq!(created.updated_at, created.created_at);

        let fetched = service.get(created.id).await.unwrap();
        assert_eq!(fetched.published_at, Some(fetched.created_at));
    }

    #[tokio::test]
    async fn test_tag_deleted_before_write_is_invalid_reference() {
        let (pool, service, author) = setup_test_service().await;
        let rust = seed_tag(&pool, "rust").await;
        let mut input = PostCreate::new("Hello", "hello", author);
        input.tag_ids = vec![rust];
        let post = Post::new(input);
        service.check_references(&post).await.unwrap();

        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(rust)
            .execute(pool.sqlite())
            .await
            .unwrap();
        let err = service.posts.create(&post).await.unwrap_err();
        let err = service.write_failed(err, &post).await;
        assert!(matches!(
            err,
            ServiceError::InvalidReference { field: "tag_ids", id } if id == rust
        ));
        assert!(service.get_by_slug("hello").await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_create_same_slug() {
        let (_pool, service, author) = setup_test_service().await;
        let (first, second) = tokio::join!(
            service.create(PostCreate::new("One", "same", author)),
            service.create(PostCreate::new("Two", "same", author))
        );

        assert_eq!(first.is_ok() as u8 + second.is_ok() as u8, 1);
        let err = first.err().or(second.err()).unwrap();
        assert!(matches!(err, ServiceError::Duplicate { field: "slug", .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_duplicate_slug() {
        let (_pool, service, author) = setup_test_service().await;
        service.create(PostCreate::new("One", "same", author)).await.unwrap();
        let err = service
            .create(PostCreate::new("Two", "same", author))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate { field: "slug", .. }));

        let other = service.create(PostCreate::new("Three", "other", author)).await.unwrap();
        let update = PostUpdate {
            slug: Some("same".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(other.id, update).await,
            Err(ServiceError::Duplicate { .. })
        ));
    }

    #[tokio::test]
    async fn test_single_field_update_leaves_rest_alone() {
        let (pool, service, author) = setup_test_service().await;
        let rust = seed_tag(&pool, "rust").await;
        let mut input = PostCreate::new("Hello", "hello", author);
        input.tag_ids = vec![rust];
        input.meta_title = Some("Meta".to_string());
        let created = service.create(input).await.unwrap();

        let update = PostUpdate {
            title: Some("Hello again".to_string()),
            ..Default::default()
        };
        let updated = service.update(created.id, update).await.unwrap();

        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.slug, created.slug);
        assert_eq!(updated.tag_ids, created.tag_ids);
        assert_eq!(updated.meta_title, created.meta_title);
        assert_eq!(updated.status, created.status);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_replaces_and_clears() {
        let (pool, service, author) = setup_test_service().await;
        let a = seed_tag(&pool, "a").await;
        let b = seed_tag(&pool, "b").await;
        let mut input = PostCreate::new("Hello", "hello", author);
        input.tag_ids = vec![a];
        input.meta_title = Some("Meta".to_string());
        let created = service.create(input).await.unwrap();

        let update = PostUpdate {
            tag_ids: Some(vec![b]),
            meta_title: Patch::Null,
            status: Some(ContentStatus::Published),
            ..Default::default()
        };
        let updated = service.update(created.id, update).await.unwrap();
        assert_eq!(updated.tag_ids, vec![b]);
        assert!(updated.meta_title.is_none());
        assert!(updated.published_at.is_some());

        let bad = PostUpdate {
            tag_ids: Some(vec![a, 404]),
            ..Default::default()
        };
        assert!(matches!(
            service.update(created.id, bad).await,
            Err(ServiceError::InvalidReference { id: 404, .. })
        ));
        assert_eq!(service.get(created.id).await.unwrap().tag_ids, vec![b]);
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let (pool, service, author) = setup_test_service().await;
        let news = seed_category(&pool, "news", None).await;

        let mut published = PostCreate::new("A", "a", author);
        published.status = ContentStatus::Published;
        published.category_ids = vec![news];
        service.create(published).await.unwrap();
        service.create(PostCreate::new("B", "b", author)).await.unwrap();

        let filter = PostFilter {
            status: Some(ContentStatus::Published),
            category_id: Some(news),
            ..Default::default()
        };
        let page = service.list(&filter, &ListParams::default()).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "a");
    }

    #[tokio::test]
    async fn test_record_view_and_delete() {
        let (_pool, service, author) = setup_test_service().await;
        let post = service.create(PostCreate::new("A", "a", author)).await.unwrap();

        assert_eq!(service.record_view(post.id).await.unwrap(), 1);
        assert_eq!(service.get_by_slug("a").await.unwrap().view_count, 1);

        service.delete(post.id).await.unwrap();
        assert!(matches!(
            service.record_view(post.id).await,
            Err(ServiceError::NotFound { .. })
        ));
        assert!(matches!(service.delete(post.id).await, Err(ServiceError::NotFound { .. })));
    }
}
