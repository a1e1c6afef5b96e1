//! Category repository
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing it on SQLite
//!
//! Hierarchy walks happen in memory over [`ParentMap`]; the repository only
//! hands out the `id -> parent_id` pairs.

use crate::db::DynDatabasePool;
use crate::models::{Category, ParentMap};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use super::missing_ids;

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn create(&self, category: &Category) -> Result<Category>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// All categories ordered by name
    async fn list(&self) -> Result<Vec<Category>>;

    /// Direct children of a category
    async fn get_children(&self, parent_id: i64) -> Result<Vec<Category>>;

    /// `id -> parent_id` for every category
    async fn parent_map(&self) -> Result<ParentMap>;

    async fn update(&self, category: &Category) -> Result<Category>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_name(&self, name: &str) -> Result<bool>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Ids from `ids` that do not exist
    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        create_category(self.pool.sqlite(), category).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        get_category_by_id(self.pool.sqlite(), id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, slug, description, parent_id, created_by_id, created_at, updated_at
            FROM categories
            WHERE slug = ?
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to get category by slug")?;

        row.as_ref().map(row_to_category).transpose()
    }

    async fn list(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, slug, description, parent_id, created_by_id, created_at, updated_at
            FROM categories
            ORDER BY name, id
            "#,
        )
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn get_children(&self, parent_id: i64) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, slug, description, parent_id, created_by_id, created_at, updated_at
            FROM categories
            WHERE parent_id = ?
            ORDER BY name, id
            "#,
        )
        .bind(parent_id)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to get children categories")?;

        rows.iter().map(row_to_category).collect()
    }

    async fn parent_map(&self) -> Result<ParentMap> {
        let rows = sqlx::query("SELECT id, parent_id FROM categories")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to load category hierarchy")?;

        Ok(ParentMap::from_pairs(
            rows.iter().map(|row| (row.get("id"), row.get("parent_id"))),
        ))
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        update_category(self.pool.sqlite(), category).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete category")?;
        Ok(())
    }

    async fn exists_by_name(&self, name: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE name = ?")
            .bind(name)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check category name existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check category slug existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn missing_ids(&self, ids: &[i64]) -> Result<Vec<i64>> {
        missing_ids(self.pool.sqlite(), "categories", ids).await
    }
}

async fn create_category(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let result = sqlx::query(
        r#"
        INSERT INTO categories (name, slug, description, parent_id, created_by_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(category.parent_id)
    .bind(category.created_by_id)
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        ..category.clone()
    })
}

async fn get_category_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let row = sqlx::query(
        r#"
        SELECT id, name, slug, description, parent_id, created_by_id, created_at, updated_at
        FROM categories
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get category by ID")?;

    row.as_ref().map(row_to_category).transpose()
}

async fn update_category(pool: &SqlitePool, category: &Category) -> Result<Category> {
    sqlx::query(
        r#"
        UPDATE categories
        SET name = ?, slug = ?, description = ?, parent_id = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(category.parent_id)
    .bind(Utc::now())
    .bind(category.id)
    .execute(pool)
    .await
    .context("Failed to update category")?;

    get_category_by_id(pool, category.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Category not found after update"))
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    Ok(Category {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        parent_id: row.get("parent_id"),
        created_by_id: row.get("created_by_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
