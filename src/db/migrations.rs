//! Database migrations
//!
//! Migrations are embedded in the binary as SQL strings and applied in
//! version order. Applied versions are tracked in the `_migrations` table.
//!
//! ```ignore
//! use folio::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! Enumerated columns carry `CHECK` constraints so that the database holds
//! only declared values even if a row is written outside the services.
//! Junction tables, comments and replies cascade on delete of their owner.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::DynDatabasePool;

/// An embedded migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Unique, ascending version number
    pub version: i32,
    pub name: &'static str,
    /// One or more `;`-separated statements
    pub up: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_users",
        up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username VARCHAR(50) NOT NULL UNIQUE,
                email VARCHAR(255) NOT NULL UNIQUE,
                password_hash VARCHAR(255) NOT NULL,
                first_name VARCHAR(100) NOT NULL DEFAULT '',
                last_name VARCHAR(100) NOT NULL DEFAULT '',
                role VARCHAR(20) NOT NULL DEFAULT 'editor'
                    CHECK (role IN ('admin', 'editor')),
                is_active BOOLEAN NOT NULL DEFAULT 1,
                last_login TIMESTAMP,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 2,
        name: "create_categories",
        up: r#"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(100) NOT NULL UNIQUE,
                slug VARCHAR(100) NOT NULL UNIQUE,
                description VARCHAR(500) NOT NULL DEFAULT '',
                parent_id INTEGER REFERENCES categories(id),
                created_by_id INTEGER NOT NULL REFERENCES users(id),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);
            CREATE INDEX IF NOT EXISTS idx_categories_created_by ON categories(created_by_id);
        "#,
    },
    Migration {
        version: 3,
        name: "create_tags",
        up: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(50) NOT NULL UNIQUE,
                slug VARCHAR(50) NOT NULL UNIQUE,
                description VARCHAR(200) NOT NULL DEFAULT '',
                color VARCHAR(7),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
        "#,
    },
    Migration {
        version: 4,
        name: "create_posts",
        up: r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                excerpt VARCHAR(500) NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                featured_image_url VARCHAR(500),
                status VARCHAR(20) NOT NULL DEFAULT 'draft'
                    CHECK (status IN ('draft', 'published', 'archived')),
                is_featured BOOLEAN NOT NULL DEFAULT 0,
                view_count INTEGER NOT NULL DEFAULT 0,
                author_id INTEGER NOT NULL REFERENCES users(id),
                published_at TIMESTAMP,
                meta_title VARCHAR(200),
                meta_description VARCHAR(300),
                seo_keywords TEXT NOT NULL DEFAULT '[]',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id);
            CREATE INDEX IF NOT EXISTS idx_posts_status ON posts(status);
            CREATE INDEX IF NOT EXISTS idx_posts_created ON posts(created_at);
        "#,
    },
    Migration {
        version: 5,
        name: "create_post_relations",
        up: r#"
            CREATE TABLE IF NOT EXISTS post_categories (
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
                PRIMARY KEY (post_id, category_id)
            );
            CREATE INDEX IF NOT EXISTS idx_post_categories_category ON post_categories(category_id);
            CREATE TABLE IF NOT EXISTS post_tags (
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (post_id, tag_id)
            );
            CREATE INDEX IF NOT EXISTS idx_post_tags_tag ON post_tags(tag_id);
        "#,
    },
    Migration {
        version: 6,
        name: "create_pages",
        up: r#"
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title VARCHAR(200) NOT NULL,
                slug VARCHAR(200) NOT NULL UNIQUE,
                content TEXT NOT NULL DEFAULT '',
                template VARCHAR(50) NOT NULL DEFAULT 'default',
                status VARCHAR(20) NOT NULL DEFAULT 'draft'
                    CHECK (status IN ('draft', 'published', 'archived')),
                is_homepage BOOLEAN NOT NULL DEFAULT 0,
                sort_order INTEGER NOT NULL DEFAULT 0,
                author_id INTEGER NOT NULL REFERENCES users(id),
                category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
                parent_id INTEGER REFERENCES pages(id),
                published_at TIMESTAMP,
                meta_title VARCHAR(200),
                meta_description VARCHAR(300),
                custom_fields TEXT NOT NULL DEFAULT '{}',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_pages_parent ON pages(parent_id);
            CREATE INDEX IF NOT EXISTS idx_pages_author ON pages(author_id);
            CREATE TABLE IF NOT EXISTS page_tags (
                page_id INTEGER NOT NULL REFERENCES pages(id) ON DELETE CASCADE,
                tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                PRIMARY KEY (page_id, tag_id)
            );
            CREATE INDEX IF NOT EXISTS idx_page_tags_tag ON page_tags(tag_id);
        "#,
    },
    Migration {
        version: 7,
        name: "create_comments",
        up: r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                parent_id INTEGER REFERENCES comments(id) ON DELETE CASCADE,
                author_name VARCHAR(100) NOT NULL,
                author_email VARCHAR(255) NOT NULL,
                content TEXT NOT NULL,
                is_approved BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
            CREATE INDEX IF NOT EXISTS idx_comments_parent ON comments(parent_id);
        "#,
    },
    Migration {
        version: 8,
        name: "create_media",
        up: r#"
            CREATE TABLE IF NOT EXISTS media (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename VARCHAR(255) NOT NULL,
                file_path VARCHAR(500) NOT NULL,
                url VARCHAR(500) NOT NULL,
                mime_type VARCHAR(100) NOT NULL,
                size INTEGER NOT NULL CHECK (size >= 0),
                alt_text VARCHAR(255),
                uploader_id INTEGER NOT NULL REFERENCES users(id),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_media_uploader ON media(uploader_id);
        "#,
    },
];

/// Apply every pending migration. Returns how many were applied.
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i64> = applied.iter().map(|m| m.version).collect();

    let mut count = 0;
    for migration in MIGRATIONS {
        if applied_versions.contains(&i64::from(migration.version)) {
            continue;
        }
        tracing::info!("Applying migration {}: {}", migration.version, migration.name);
        apply_migration(pool, migration)
            .await
            .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
        count += 1;
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    pool.execute(
        r#"
        CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .await?;
    Ok(())
}

async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool.sqlite())
        .await
        .context("Failed to read applied migrations")?;

    Ok(rows
        .iter()
        .map(|row| MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        })
        .collect())
}

/// Statements and the bookkeeping row go through one transaction
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.sqlite().begin().await?;

    for statement in split_sql_statements(migration.up) {
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
    }

    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Shorten SQL for error messages
fn truncate_sql(sql: &str) -> String {
    match sql.char_indices().nth(100) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

/// Split SQL into individual statements, skipping comment-only fragments
fn split_sql_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty() && !is_comment_only(stmt))
        .collect()
}

fn is_comment_only(s: &str) -> bool {
    s.lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    Ok(pending_count(pool).await? == 0)
}

pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;
    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}

pub fn get_migration(version: i32) -> Option<&'static Migration> {
    MIGRATIONS.iter().find(|m| m.version == version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    async fn migrated_pool() -> DynDatabasePool {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        run_migrations(&pool).await.expect("Failed to run migrations");
        pool
    }

    async fn insert_user(pool: &DynDatabasePool, username: &str) -> i64 {
        sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, 'x')")
            .bind(username)
            .bind(format!("{}@example.com", username))
            .execute(pool.sqlite())
            .await
            .expect("Failed to insert user")
            .last_insert_rowid()
    }

    async fn count(pool: &DynDatabasePool, table: &str) -> i64 {
        sqlx::query(&format!("SELECT COUNT(*) AS count FROM {}", table))
            .fetch_one(pool.sqlite())
            .await
            .unwrap()
            .get("count")
    }

    #[tokio::test]
    async fn test_run_migrations_is_idempotent() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(pending_count(&pool).await.unwrap(), total_migrations());

        let applied = run_migrations(&pool).await.unwrap();
        assert_eq!(applied, total_migrations());
        assert!(is_up_to_date(&pool).await.unwrap());

        assert_eq!(run_migrations(&pool).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_all_tables_created() {
        let pool = migrated_pool().await;
        for table in [
            "users",
            "categories",
            "tags",
            "posts",
            "post_categories",
            "post_tags",
            "pages",
            "page_tags",
            "comments",
            "media",
        ] {
            assert_eq!(count(&pool, table).await, 0, "table {} missing", table);
        }
    }

    #[tokio::test]
    async fn test_role_check_constraint() {
        let pool = migrated_pool().await;
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, role) VALUES ('a', 'a@x.io', 'x', 'root')",
        )
        .execute(pool.sqlite())
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_status_check_constraint() {
        let pool = migrated_pool().await;
        let author = insert_user(&pool, "writer").await;
        let result = sqlx::query(
            "INSERT INTO posts (title, slug, author_id, status) VALUES ('t', 't', ?, 'scheduled')",
        )
        .bind(author)
        .execute(pool.sqlite())
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_foreign_key_rejects_missing_author() {
        let pool = migrated_pool().await;
        let result = sqlx::query("INSERT INTO posts (title, slug, author_id) VALUES ('t', 't', 999)")
            .execute(pool.sqlite())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_post_delete_cascades_edges_and_comments() {
        let pool = migrated_pool().await;
        let db = pool.sqlite();
        let author = insert_user(&pool, "writer").await;

        let post_id = sqlx::query("INSERT INTO posts (title, slug, author_id) VALUES ('t', 't', ?)")
            .bind(author)
            .execute(db)
            .await
            .unwrap()
            .last_insert_rowid();
        let tag_id = sqlx::query("INSERT INTO tags (name, slug) VALUES ('rust', 'rust')")
            .execute(db)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO post_tags (post_id, tag_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(tag_id)
            .execute(db)
            .await
            .unwrap();
        let root = sqlx::query(
            "INSERT INTO comments (post_id, author_name, author_email, content) VALUES (?, 'a', 'a@x.io', 'hi')",
        )
        .bind(post_id)
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid();
        sqlx::query(
            "INSERT INTO comments (post_id, parent_id, author_name, author_email, content) VALUES (?, ?, 'b', 'b@x.io', 're')",
        )
        .bind(post_id)
        .bind(root)
        .execute(db)
        .await
        .unwrap();

        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(post_id)
            .execute(db)
            .await
            .unwrap();

        assert_eq!(count(&pool, "post_tags").await, 0);
        assert_eq!(count(&pool, "comments").await, 0);
        assert_eq!(count(&pool, "tags").await, 1);
    }

    #[tokio::test]
    async fn test_category_delete_nulls_page_category() {
        let pool = migrated_pool().await;
        let db = pool.sqlite();
        let author = insert_user(&pool, "writer").await;

        let category_id = sqlx::query("INSERT INTO categories (name, slug, created_by_id) VALUES ('News', 'news', ?)")
            .bind(author)
            .execute(db)
            .await
            .unwrap()
            .last_insert_rowid();
        sqlx::query("INSERT INTO pages (title, slug, author_id, category_id) VALUES ('p', 'p', ?, ?)")
            .bind(author)
            .bind(category_id)
            .execute(db)
            .await
            .unwrap();

        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(category_id)
            .execute(db)
            .await
            .unwrap();

        let row = sqlx::query("SELECT category_id FROM pages")
            .fetch_one(db)
            .await
            .unwrap();
        assert_eq!(row.get::<Option<i64>, _>("category_id"), None);
    }

    #[test]
    fn test_get_migration() {
        assert_eq!(get_migration(1).map(|m| m.name), Some("create_users"));
        assert!(get_migration(99).is_none());
    }

    #[test]
    fn test_versions_ascending() {
        let versions: Vec<i32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn test_split_sql_statements() {
        let sql = "CREATE TABLE a (id INT);\n-- note\n;\nCREATE INDEX i ON a(id);";
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert!(statements[1].starts_with("CREATE INDEX"));
    }

    #[test]
    fn test_is_comment_only() {
        assert!(is_comment_only("-- a\n  -- b"));
        assert!(!is_comment_only("-- a\nSELECT 1"));
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
        let long = "x".repeat(150);
        assert_eq!(truncate_sql(&long).len(), 103);
    }
}
