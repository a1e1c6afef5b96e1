//! Tag repository
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing it on SQLite

use crate::db::DynDatabasePool;
use crate::models::Tag;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::missing_ids;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, tag: &Tag) -> Result<Tag>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// All tags ordered by name
    async fn list(&self) -> Result<Vec<Tag>>;

    async fn update(&self, tag: &Tag) -> Result<Tag>;

    /// Delete a tag; its post and page links go with it
    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_name(&self, name: &str) -> Result<bool>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Ids from `ids` that do not exist
    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based tag repository implementation
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, tag: &Tag) -> Result<Tag> {
        let result = sqlx::query(
            r#"
            INSERT INTO tags (name, slug, description, color, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&tag.name)
        .bind(&tag.slug)
        .bind(&tag.description)
        .bind(&tag.color)
        .bind(tag.created_at)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create tag")?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            ..tag.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        get_tag_by_id(self.pool.sqlite(), id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(
            "SELECT id, name, slug, description, color, created_at FROM tags WHERE slug = ?",
        )
        .bind(slug)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get tag by slug")?;

        row.as_ref().map(row_to_tag).transpose()
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, name, slug, description, color, created_at FROM tags ORDER BY name, id",
        )
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list tags")?;

        rows.iter().map(row_to_tag).collect()
    }

    async fn update(&self, tag: &Tag) -> Result<Tag> {
        sqlx::query("UPDATE tags SET name = ?, slug = ?, description = ?, color = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(&tag.slug)
            .bind(&tag.description)
            .bind(&tag.color)
            .bind(tag.id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update tag")?;

        get_tag_by_id(self.pool.sqlite(), tag.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Tag not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete tag")?;
        Ok(())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check tag name existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check tag slug existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        missing_ids(self.pool.sqlite(), "tags", ids).await
    }
}

async fn get_tag_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(
        "SELECT id, name, slug, description, color, created_at FROM tags WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by ID")?;

    row.as_ref().map(row_to_tag).transpose()
}

fn row_to_tag(row: &sqlx::sqlite::SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        color: row.get("color"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{migrated_pool, seed_post, seed_user};
    use crate::models::TagCreate;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxTagRepository) {
        let pool = migrated_pool().await;
        let repo = SqlxTagRepository::new(pool.clone());
        (pool, repo)
    }

    fn new_tag(name: &str, slug: &str, color: Option<&str>) -> Tag {
        Tag::new(TagCreate {
            name: name.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            color: color.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo.create(&new_tag("Rust", "rust", Some("#f74c00"))).await.unwrap();

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.color.as_deref(), Some("#f74c00"));
        assert!(repo.get_by_slug("rust").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_update_clears_color() {
        let (_pool, repo) = setup_test_repo().await;
        let mut tag = repo.create(&new_tag("Go", "go", Some("#00add8"))).await.unwrap();

        tag.color = None;
        let updated = repo.update(&tag).await.unwrap();
        assert!(updated.color.is_none());
        assert_eq!(updated.created_at, tag.created_at);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected_by_schema() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&new_tag("Rust", "rust", None)).await.unwrap();
        assert!(repo.create(&new_tag("Rust Lang", "rust", None)).await.is_err());
        assert!(repo.exists_by_slug("rust").await.unwrap());
        assert!(repo.exists_by_name("Rust").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_cascades_post_links() {
        let (pool, repo) = setup_test_repo().await;
        let author = seed_user(&pool, "writer").await;
        let post = seed_post(&pool, author, "hello").await;
        let tag = repo.create(&new_tag("Rust", "rust", None)).await.unwrap();
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post)
            .bind(tag.id)
            .execute(pool.sqlite())
            .await
            .unwrap();

        repo.delete(tag.id).await.unwrap();

        let row = sqlx::query("SELECT COUNT(*) AS count FROM post_tags")
            .fetch_one(pool.sqlite())
            .await
            .unwrap();
        assert_eq!(row.get::<i64, _>("count"), 0);
        assert!(repo.list().await.unwrap().is_empty());
    }
}
