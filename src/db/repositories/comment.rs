//! Comment repository

use crate::db::DynDatabasePool;
use crate::models::Comment;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a post, oldest first
    async fn list_by_post(&self, post_id: i64, approved_only: bool) -> Result<Vec<Comment>>;

    async fn update(&self, comment: &Comment) -> Result<Comment>;

    /// Delete a comment together with every reply below it
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        let result = sqlx::query(
            r#"
            INSERT INTO comments (post_id, parent_id, author_name, author_email, content,
                                  is_approved, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(&comment.author_name)
        .bind(&comment.author_email)
        .bind(&comment.content)
        .bind(comment.is_approved)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            ..comment.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        get_comment_by_id(self.pool.sqlite(), id).await
    }

    async fn list_by_post(&self, post_id: i64, approved_only: bool) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, post_id, parent_id, author_name, author_email, content,
                   is_approved, created_at, updated_at
            FROM comments
            WHERE post_id = ? AND (? = 0 OR is_approved = 1)
            ORDER BY created_at, id
            "#,
        )
        .bind(post_id)
        .bind(approved_only)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to list comments")?;

        rows.iter().map(row_to_comment).collect()
    }

    async fn update(&self, comment: &Comment) -> Result<Comment> {
        sqlx::query("UPDATE comments SET content = ?, is_approved = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(comment.is_approved)
            .bind(comment.updated_at)
            .bind(comment.id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update comment")?;

        get_comment_by_id(self.pool.sqlite(), comment.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Comment not found after update"))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }
}

async fn get_comment_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(
        r#"
        SELECT id, post_id, parent_id, author_name, author_email, content,
               is_approved, created_at, updated_at
        FROM comments
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get comment by ID")?;

    row.as_ref().map(row_to_comment).transpose()
}

fn row_to_comment(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        parent_id: row.get("parent_id"),
        author_name: row.get("author_name"),
        author_email: row.get("author_email"),
        content: row.get("content"),
        is_approved: row.get("is_approved"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
