//! Page repository
//!
//! Pages mirror posts: the row and its `page_tags` edges are written in one
//! transaction. The page hierarchy is exposed as a [`ParentMap`].

use crate::db::DynDatabasePool;
use crate::models::{ContentStatus, ListParams, Page, PageTagLink, ParentMap};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqliteExecutor};
use std::str::FromStr;
use std::sync::Arc;

use super::{decode_json, edge_map, replace_edges};

const PAGE_COLUMNS: &str = "id, title, slug, content, template, status, is_homepage, \
     sort_order, author_id, category_id, parent_id, published_at, meta_title, \
     meta_description, custom_fields, created_at, updated_at";

/// Page repository trait
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Insert the page and its tag links atomically
    async fn create(&self, page: &Page) -> Result<Page>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>>;

    /// Ordered by `sort_order`, then id, with the total count
    async fn list(&self, params: &ListParams) -> Result<(Vec<Page>, i64)>;

    /// Every page, same ordering as `list`
    async fn list_all(&self) -> Result<Vec<Page>>;

    /// `id -> parent_id` for every page
    async fn parent_map(&self) -> Result<ParentMap>;

    async fn count_children(&self, id: i64) -> Result<i64>;

    /// Persist every column and replace the tag links atomically
    async fn update(&self, page: &Page) -> Result<Page>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    async fn exists_by_slug_excluding(&self, slug: &str, id: i64) -> Result<bool>;
}

/// SQLx-based page repository implementation
pub struct SqlxPageRepository {
    pool: DynDatabasePool,
}

impl SqlxPageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PageRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PageRepository for SqlxPageRepository {
    async fn create(&self, page: &Page) -> Result<Page> {
        let mut tx = self.pool.sqlite().begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO pages (title, slug, content, template, status, is_homepage, sort_order,
                               author_id, category_id, parent_id, published_at, meta_title,
                               meta_description, custom_fields, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(&page.template)
        .bind(page.status.as_str())
        .bind(page.is_homepage)
        .bind(page.sort_order)
        .bind(page.author_id)
        .bind(page.category_id)
        .bind(page.parent_id)
        .bind(page.published_at)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(serde_json::to_string(&page.custom_fields)?)
        .bind(page.created_at)
        .bind(page.updated_at)
        .execute(&mut *tx)
        .await
        .context("Failed to create page")?;

        let id = result.last_insert_rowid();
        replace_edges(&mut tx, id, &PageTagLink::for_page(id, &page.tag_ids)).await?;
        tx.commit().await.context("Failed to commit page")?;

        Ok(Page {
            id,
            ..page.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Page>> {
        let sql = format!("SELECT {} FROM pages WHERE id = ?", PAGE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get page by ID")?;
        self.single(row).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>> {
        let sql = format!("SELECT {} FROM pages WHERE slug = ?", PAGE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get page by slug")?;
        self.single(row).await
    }

    async fn list(&self, params: &ListParams) -> Result<(Vec<Page>, i64)> {
        let pool = self.pool.sqlite();
        let sql = format!(
            "SELECT {} FROM pages ORDER BY sort_order, id LIMIT ? OFFSET ?",
            PAGE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(pool)
            .await
            .context("Failed to list pages")?;
        let pages = rows.iter().map(row_to_page).collect::<Result<Vec<_>>>()?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM pages")
            .fetch_one(pool)
            .await
            .context("Failed to count pages")?
            .get("count");

        Ok((with_tags(pool, pages).await?, total))
    }

    async fn list_all(&self) -> Result<Vec<Page>> {
        let pool = self.pool.sqlite();
        let sql = format!("SELECT {} FROM pages ORDER BY sort_order, id", PAGE_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(pool)
            .await
            .context("Failed to list pages")?;
        let pages = rows.iter().map(row_to_page).collect::<Result<Vec<_>>>()?;
        with_tags(pool, pages).await
    }

    async fn parent_map(&self) -> Result<ParentMap> {
        let rows = sqlx::query("SELECT id, parent_id FROM pages")
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to load page hierarchy")?;

        Ok(ParentMap::from_pairs(
            rows.iter().map(|row| (row.get("id"), row.get("parent_id"))),
        ))
    }

    async fn count_children(&self, id: i64) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM pages WHERE parent_id = ?")
            .bind(id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count child pages")?;
        Ok(row.get("count"))
    }

    async fn update(&self, page: &Page) -> Result<Page> {
        let mut tx = self.pool.sqlite().begin().await?;

        sqlx::query(
            r#"
            UPDATE pages
            SET title = ?, slug = ?, content = ?, template = ?, status = ?, is_homepage = ?,
                sort_order = ?, category_id = ?, parent_id = ?, published_at = ?,
                meta_title = ?, meta_description = ?, custom_fields = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&page.title)
        .bind(&page.slug)
        .bind(&page.content)
        .bind(&page.template)
        .bind(page.status.as_str())
        .bind(page.is_homepage)
        .bind(page.sort_order)
        .bind(page.category_id)
        .bind(page.parent_id)
        .bind(page.published_at)
        .bind(&page.meta_title)
        .bind(&page.meta_description)
        .bind(serde_json::to_string(&page.custom_fields)?)
        .bind(page.updated_at)
        .bind(page.id)
        .execute(&mut *tx)
        .await
        .context("Failed to update page")?;

        replace_edges(&mut tx, page.id, &PageTagLink::for_page(page.id, &page.tag_ids)).await?;
        tx.commit().await.context("Failed to commit page update")?;

        self.get_by_id(page.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Page not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM pages WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete page")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check page slug existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }

    async fn exists_by_slug_excluding(&self, slug: &str, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM pages WHERE slug = ? AND id != ?")
            .bind(slug)
            .bind(id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check page slug existence")?;
        Ok(row.get::<i64, _>("count") > 0)
    }
}

impl SqlxPageRepository {
    async fn single(&self, row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Page>> {
        match row {
            Some(row) => {
                let page = row_to_page(&row)?;
                Ok(with_tags(self.pool.sqlite(), vec![page]).await?.pop())
            }
            None => Ok(None),
        }
    }
}

async fn with_tags<'c, E>(executor: E, mut pages: Vec<Page>) -> Result<Vec<Page>>
where
    E: SqliteExecutor<'c>,
{
    let ids: Vec<i64> = pages.iter().map(|p| p.id).collect();
    let mut tags = edge_map::<PageTagLink>(executor, &ids).await?;
    for page in &mut pages {
        page.tag_ids = tags.remove(&page.id).unwrap_or_default();
    }
    Ok(pages)
}

fn row_to_page(row: &sqlx::sqlite::SqliteRow) -> Result<Page> {
    let status_str: String = row.get("status");
    let status = ContentStatus::from_str(&status_str)
        .with_context(|| format!("Invalid status in database: {}", status_str))?;
    let custom_fields: String = row.get("custom_fields");

    Ok(Page {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        content: row.get("content"),
        template: row.get("template"),
        status,
        is_homepage: row.get("is_homepage"),
        sort_order: row.get("sort_order"),
        author_id: row.get("author_id"),
        category_id: row.get("category_id"),
        parent_id: row.get("parent_id"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        meta_title: row.get("meta_title"),
        meta_description: row.get("meta_description"),
        custom_fields: decode_json(&custom_fields, "custom_fields")?,
        tag_ids: Vec::new(),
    })
}
