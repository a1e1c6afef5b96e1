//! Media repository

use crate::db::DynDatabasePool;
use crate::models::{ListParams, Media};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Media repository trait
#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn create(&self, media: &Media) -> Result<Media>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Media>>;

    /// Newest first, with the total count
    async fn list(&self, params: &ListParams) -> Result<(Vec<Media>, i64)>;

    async fn update(&self, media: &Media) -> Result<Media>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based media repository implementation
pub struct SqlxMediaRepository {
    pool: DynDatabasePool,
}

impl SqlxMediaRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MediaRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl MediaRepository for SqlxMediaRepository {
    async fn create(&self, media: &Media) -> Result<Media> {
        let result = sqlx::query(
            r#"
            INSERT INTO media (filename, file_path, url, mime_type, size, alt_text,
                               uploader_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&media.filename)
        .bind(&media.file_path)
        .bind(&media.url)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(&media.alt_text)
        .bind(media.uploader_id)
        .bind(media.created_at)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create media")?;

        Ok(Media {
            id: result.last_insert_rowid(),
            ..media.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Media>> {
        get_media_by_id(self.pool.sqlite(), id).await
    }

    async fn list(&self, params: &ListParams) -> Result<(Vec<Media>, i64)> {
        let pool = self.pool.sqlite();
        let rows = sqlx::query(
            r#"
            SELECT id, filename, file_path, url, mime_type, size, alt_text, uploader_id, created_at
            FROM media
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list media")?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS count FROM media")
            .fetch_one(pool)
            .await
            .context("Failed to count media")?
            .get("count");

        let items = rows.iter().map(row_to_media).collect::<Result<Vec<_>>>()?;
        Ok((items, total))
    }

    async fn update(&self, media: &Media) -> Result<Media> {
        sqlx::query("UPDATE media SET filename = ?, alt_text = ? WHERE id = ?")
            .bind(&media.filename)
            .bind(&media.alt_text)
            .bind(media.id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update media")?;

        get_media_by_id(self.pool.sqlite(), media.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Media not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM media WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete media")?;
        Ok(())
    }
}

async fn get_media_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Media>> {
    let row = sqlx::query(
        r#"
        SELECT id, filename, file_path, url, mime_type, size, alt_text, uploader_id, created_at
        FROM media
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get media by ID")?;

    row.as_ref().map(row_to_media).transpose()
}

fn row_to_media(row: &sqlx::sqlite::SqliteRow) -> Result<Media> {
    Ok(Media {
        id: row.get("id"),
        filename: row.get("filename"),
        file_path: row.get("file_path"),
        url: row.get("url"),
        mime_type: row.get("mime_type"),
        size: row.get("size"),
        alt_text: row.get("alt_text"),
        uploader_id: row.get("uploader_id"),
        created_at: row.get("created_at"),
    })
}
