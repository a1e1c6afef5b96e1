//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod category;
pub mod comment;
pub mod media;
pub mod page;
pub mod post;
pub mod tag;
pub mod user;

pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use media::{MediaRepository, SqlxMediaRepository};
pub use page::{PageRepository, SqlxPageRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use tag::{SqlxTagRepository, TagRepository};
pub use user::{SqlxUserRepository, UserRepository};

use crate::models::Edge;
use anyhow::{Context, Result};
use sqlx::{Row, SqliteConnection, SqliteExecutor};
use std::collections::HashMap;

/// A SQLite constraint that rejected a write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// `UNIQUE constraint failed: <table>.<column>`; the first column of a
    /// composite key is reported
    Unique { table: String, column: String },
    ForeignKey,
}

impl ConstraintViolation {
    /// Look for a constraint failure anywhere in the cause chain of `err`
    pub fn find(err: &anyhow::Error) -> Option<Self> {
        let db = err.chain().find_map(|cause| match cause.downcast_ref::<sqlx::Error>() {
            Some(sqlx::Error::Database(db)) => Some(db),
            _ => None,
        })?;

        if db.is_unique_violation() {
            let (table, column) = db
                .message()
                .rsplit(": ")
                .next()
                .and_then(|columns| columns.split(", ").next())
                .and_then(|column| column.split_once('.'))
                .unwrap_or_default();
            Some(Self::Unique {
                table: table.to_string(),
                column: column.to_string(),
            })
        } else if db.is_foreign_key_violation() {
            Some(Self::ForeignKey)
        } else {
            None
        }
    }
}

/// Ids from `ids` with no row in `table`, ascending.
///
/// The id list travels as one JSON parameter and is expanded with
/// `json_each`, so the statement text does not depend on the list length.
pub(crate) async fn missing_ids<'e>(
    executor: impl SqliteExecutor<'e>,
    table: &'static str,
    ids: &[i64],
) -> Result<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT DISTINCT value AS id FROM json_each(?) \
         WHERE value NOT IN (SELECT id FROM {}) ORDER BY value",
        table
    );
    let rows = sqlx::query(&sql)
        .bind(serde_json::to_string(ids)?)
        .fetch_all(executor)
        .await
        .with_context(|| format!("Failed to check ids in {}", table))?;
    Ok(rows.iter().map(|row| row.get("id")).collect())
}

/// Junction lookup `owner -> [target, ...]` (targets ascending) for a batch of owners
pub(crate) async fn edge_map<'e, L: Edge>(
    executor: impl SqliteExecutor<'e>,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let mut map: HashMap<i64, Vec<i64>> = HashMap::new();
    if owner_ids.is_empty() {
        return Ok(map);
    }
    let sql = format!(
        "SELECT {owner} AS owner, {target} AS target FROM {table} \
         WHERE {owner} IN (SELECT value FROM json_each(?)) ORDER BY {owner}, {target}",
        owner = L::OWNER_COLUMN,
        target = L::TARGET_COLUMN,
        table = L::TABLE
    );
    let rows = sqlx::query(&sql)
        .bind(serde_json::to_string(owner_ids)?)
        .fetch_all(executor)
        .await
        .with_context(|| format!("Failed to load {}", L::TABLE))?;

    for row in rows {
        map.entry(row.get("owner")).or_default().push(row.get("target"));
    }
    Ok(map)
}

/// Replace every junction row of `owner_id` with `links`.
///
/// Runs on a borrowed connection so callers can keep it inside their own
/// transaction; a missing target fails on the foreign key.
pub(crate) async fn replace_edges<L: Edge>(
    conn: &mut SqliteConnection,
    owner_id: i64,
    links: &[L],
) -> Result<()> {
    sqlx::query(&format!("DELETE FROM {} WHERE {} = ?", L::TABLE, L::OWNER_COLUMN))
        .bind(owner_id)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to clear {}", L::TABLE))?;

    let insert = format!(
        "INSERT INTO {} ({}, {}) VALUES (?, ?)",
        L::TABLE,
        L::OWNER_COLUMN,
        L::TARGET_COLUMN
    );
    for link in links {
        sqlx::query(&insert)
            .bind(link.owner_id())
            .bind(link.target_id())
            .execute(&mut *conn)
            .await
            .with_context(|| {
                format!("Failed to link {} {} in {}", L::TARGET_COLUMN, link.target_id(), L::TABLE)
            })?;
    }
    Ok(())
}

/// Decode a JSON text column, naming the column on failure
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(raw: &str, column: &str) -> Result<T> {
    serde_json::from_str(raw).with_context(|| format!("Invalid JSON in column {}", column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{migrated_pool, seed_post, seed_tag, seed_user};
    use crate::models::PostTagLink;

    #[tokio::test]
    async fn test_constraint_violation_unique() {
        let pool = migrated_pool().await;
        seed_tag(&pool, "rust").await;

        let err = sqlx::query("INSERT INTO tags (name, slug) VALUES ('other', 'rust')")
            .execute(pool.sqlite())
            .await
            .context("Failed to create tag")
            .unwrap_err();
        assert_eq!(
            ConstraintViolation::find(&err),
            Some(ConstraintViolation::Unique {
                table: "tags".to_string(),
                column: "slug".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_constraint_violation_foreign_key() {
        let pool = migrated_pool().await;
        let err = sqlx::query("INSERT INTO posts (title, slug, author_id) VALUES ('t', 't', 404)")
            .execute(pool.sqlite())
            .await
            .context("Failed to create post")
            .unwrap_err();
        assert_eq!(ConstraintViolation::find(&err), Some(ConstraintViolation::ForeignKey));

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(ConstraintViolation::find(&other), None);
    }

    #[tokio::test]
    async fn test_missing_ids() {
        let pool = migrated_pool().await;
        let a = seed_tag(&pool, "a").await;
        let b = seed_tag(&pool, "b").await;

        let missing = missing_ids(pool.sqlite(), "tags", &[a, 99, b, 42, 99]).await.unwrap();
        assert_eq!(missing, vec![42, 99]);
        assert!(missing_ids(pool.sqlite(), "tags", &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_edge_map_groups_by_owner() {
        let pool = migrated_pool().await;
        let author = seed_user(&pool, "writer").await;
        let p1 = seed_post(&pool, author, "one").await;
        let p2 = seed_post(&pool, author, "two").await;
        let t1 = seed_tag(&pool, "t1").await;
        let t2 = seed_tag(&pool, "t2").await;

        for (post, tag) in [(p1, t2), (p1, t1), (p2, t2)] {
            sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
                .bind(post)
                .bind(tag)
                .execute(pool.sqlite())
                .await
                .unwrap();
        }

        let map = edge_map::<PostTagLink>(pool.sqlite(), &[p1, p2])
            .await
            .unwrap();
        assert_eq!(map[&p1], vec![t1, t2]);
        assert_eq!(map[&p2], vec![t2]);
    }
}
