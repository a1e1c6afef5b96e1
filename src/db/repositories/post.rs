//! Post repository
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing it on SQLite
//!
//! A post row and its `post_categories` / `post_tags` edges are always
//! written in one transaction.

use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, ListParams, Post, PostCategoryLink, PostFilter, PostTagLink};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteConnection, SqliteExecutor};
use std::str::FromStr;
use std::sync::Arc;

use super::{decode_json, edge_map, replace_edges};

const POST_COLUMNS: &str = "id, title, slug, excerpt, content, featured_image_url, status, \
     is_featured, view_count, author_id, published_at, meta_title, meta_description, \
     seo_keywords, created_at, updated_at";

/// `?1` status, `?2` category, `?3` tag, `?4` author; NULL disables a clause
const FILTER_CLAUSE: &str = r#"
    WHERE (?1 IS NULL OR p.status = ?1)
      AND (?2 IS NULL OR EXISTS (
            SELECT 1 FROM post_categories pc WHERE pc.post_id = p.id AND pc.category_id = ?2))
      AND (?3 IS NULL OR EXISTS (
            SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ?3))
      AND (?4 IS NULL OR p.author_id = ?4)
"#;

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert the post and its category / tag links atomically
    async fn create(&self, post: &Post) -> Result<Post>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    /// Newest first, with the total number of matching posts
    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<(Vec<Post>, i64)>;

    /// Persist every column and replace both link sets atomically
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post; links and comments cascade
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Slug taken by any post other than `id`
    async fn exists_by_slug_excluding(&self, slug: &str, id: i64) -> Result<bool>;

    /// Bump the view counter; `None` if the post does not exist
    async fn increment_view_count(&self, id: i64) -> Result<Option<i64>>;
}

/// SQLx-based post repository implementation
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        let mut tx = self.pool.sqlite().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, slug, excerpt, content, featured_image_url, status,
                               is_featured, view_count, author_id, published_at, meta_title,
                               meta_description, seo_keywords, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.featured_image_url)
        .bind(post.status.as_str())
        .bind(post.is_featured)
        .bind(post.view_count)
        .bind(post.author_id)
        .bind(post.published_at)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(serde_json::to_string(&post.seo_keywords)?)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to create post")?;

        let id = result.last_insert_rowid();
        write_links(&mut tx, id, post).await?;
        tx.commit().await.context("Failed to commit post")?;

        Ok(Post { id, ..post.clone() })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        fetch_one_by(self.pool.sqlite(), "id = ?", id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        fetch_one_by(self.pool.sqlite(), "slug = ?", slug.to_owned()).await
    }

    async fn list(&self, filter: &PostFilter, params: &ListParams) -> Result<(Vec<Post>, i64)> {
        let pool = self.pool.sqlite();
        let status = filter.status.map(|s| s.as_str());

        let sql = format!(
            "SELECT {} FROM posts p {} ORDER BY p.created_at DESC, p.id DESC LIMIT ?5 OFFSET ?6",
            POST_COLUMNS, FILTER_CLAUSE
        );
        let rows = sqlx::query(&sql)
            .bind(status)
            .bind(filter.category_id)
            .bind(filter.tag_id)
            .bind(filter.author_id)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list posts")?;
        let posts = rows.iter().map(row_to_post).collect::<Result<Vec<_>>>()?;

        let count_sql = format!("SELECT COUNT(*) AS count FROM posts p {}", FILTER_CLAUSE);
        let total: i64 = sqlx::query(&count_sql)
            .bind(status)
            .bind(filter.category_id)
            .bind(filter.tag_id)
            .bind(filter.author_id)
            .fetch_one(pool)
            .await
            .context("Failed to count posts")?
            .get("count");

        Ok((with_links(pool, posts).await?, total))
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let mut tx = self.pool.sqlite().begin().await?;

        sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, slug = ?, excerpt = ?, content = ?, featured_image_url = ?,
                status = ?, is_featured = ?, published_at = ?, meta_title = ?,
                meta_description = ?, seo_keywords = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.featured_image_url)
        .bind(post.status.as_str())
        .bind(post.is_featured)
        .bind(post.published_at)
        .bind(&post.meta_title)
        .bind(&post.meta_description)
        .bind(serde_json::to_string(&post.seo_keywords)?)
        .bind(post.updated_at)
        .bind(post.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update post")?;

        write_links(&mut tx, post.id, post).await?;
        tx.commit().await.context("Failed to commit post update")?;

        fetch_one_by(self.pool.sqlite(), "id = ?", post.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Post not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete post")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check post slug existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn exists_by_slug_excluding(&self, slug: &str, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM posts WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check post slug existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn increment_view_count(&self, id: i64) -> Result<Option<i64>> {
        let row = sqlx::query(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ? RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to increment view count")?;
        Ok(row.map(|r| r.get("view_count")))
    }
}

async fn write_links(conn: &mut SqliteConnection, post_id: i64, post: &Post) -> Result<()> {
    let categories = PostCategoryLink::for_post(post_id, &post.category_ids);
    replace_edges(&mut *conn, post_id, &categories).await?;
    replace_edges(&mut *conn, post_id, &PostTagLink::for_post(post_id, &post.tag_ids)).await
}

/// Fetch a single post by a fixed predicate, links included
async fn fetch_one_by<'c, E, T>(executor: E, predicate: &str, value: T) -> Result<Option<Post>>
where
    E: SqliteExecutor<'c> + Copy,
    T: for<'e> sqlx::Encode<'e, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send + 'static,
{
    let sql = format!("SELECT {} FROM posts WHERE {}", POST_COLUMNS, predicate);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(executor)
        .await
        .context("Failed to get post")?;

    match row {
        Some(row) => {
            let post = row_to_post(&row)?;
            Ok(with_links(executor, vec![post]).await?.pop())
        }
        None => Ok(None),
    }
}

/// Attach category and tag ids to a batch of posts
async fn with_links<'c, E>(executor: E, mut posts: Vec<Post>) -> Result<Vec<Post>>
where
    E: SqliteExecutor<'c> + Copy,
{
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    let mut categories = edge_map::<PostCategoryLink>(executor, &ids).await?;
    let mut tags = edge_map::<PostTagLink>(executor, &ids).await?;

    for post in &mut posts {
        post.category_ids = categories.remove(&post.id).unwrap_or_default();
        post.tag_ids = tags.remove(&post.id).unwrap_or_default();
    }
    Ok(posts)
}

fn row_to_post(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;
    let keywords: String = row.get("seo_keywords");

    Ok(Post {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        excerpt: row.get("excerpt"),
        content: row.get("content"),
        featured_image_url: row.get("featured_image_url"),
        status,
        is_featured: row.get("is_featured"),
        view_count: row.get("view_count"),
        author_id: row.get("author_id"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        meta_title: row.get("meta_title"),
        meta_description: row.get("meta_description"),
        seo_keywords: decode_json(&keywords, "seo_keywords")?,
        category_ids: Vec::new(),
        tag_ids: Vec::new(),
    })
}
