//! User repository
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing it on SQLite

use crate::db::DynDatabasePool;
use crate::models::{ListParams, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
     is_active, last_login, created_at, updated_at";

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; returns it with its assigned id
    async fn create(&self, user: &User) -> Result<User>;

    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Persist every column of `user`
    async fn update(&self, user: &User) -> Result<User>;

    /// Stamp a successful login
    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn count(&self) -> Result<i64>;

    /// One page of users in creation order, plus the total count
    async fn list(&self, params: &ListParams) -> Result<(Vec<User>, i64)>;

    async fn exists_by_username(&self, username: &str) -> Result<bool>;

    async fn exists_by_email(&self, email: &str) -> Result<bool>;

    /// Number of posts, pages, media items and categories owned by the user
    async fn count_owned_content(&self, id: i64) -> Result<i64>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        create_user(self.pool.sqlite(), user).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        get_user_by(self.pool.sqlite(), "id", id).await
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        get_user_by(self.pool.sqlite(), "username", username.to_owned()).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        get_user_by(self.pool.sqlite(), "email", email.to_owned()).await
    }

    async fn update(&self, user: &User) -> Result<User> {
        update_user(self.pool.sqlite(), user).await
    }

    async fn update_last_login(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to update last login")?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete user")?;
        Ok(())
    }

    async fn count(&self) -> Result<i64> {
        count_users(self.pool.sqlite()).await
    }

    async fn list(&self, params: &ListParams) -> Result<(Vec<User>, i64)> {
        list_users(self.pool.sqlite(), params).await
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool> {
        Ok(self.get_by_email(email).await?.is_some())
    }

    async fn count_owned_content(&self, id: i64) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM posts WHERE author_id = ?1)
              + (SELECT COUNT(*) FROM pages WHERE author_id = ?1)
              + (SELECT COUNT(*) FROM media WHERE uploader_id = ?1)
              + (SELECT COUNT(*) FROM categories WHERE created_by_id = ?1) AS owned
            "#,
        )
        .bind(id)
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to count owned content")?;
        Ok(row.get("owned"))
    }
}

async fn create_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        INSERT INTO users (username, email, password_hash, first_name, last_name, role,
                           is_active, last_login, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(user.last_login)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        ..user.clone()
    })
}

/// Fetch one user by a unique column. `column` is always a literal from this module.
async fn get_user_by<T>(pool: &SqlitePool, column: &str, value: T) -> Result<Option<User>>
where
    T: for<'e> sqlx::Encode<'e, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite> + Send + 'static,
{
    let sql = format!("SELECT {} FROM users WHERE {} = ?", USER_COLUMNS, column);
    let row = sqlx::query(&sql)
        .bind(value)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", column))?;

    row.as_ref().map(row_to_user).transpose()
}

async fn update_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET username = ?, email = ?, password_hash = ?, first_name = ?, last_name = ?,
            role = ?, is_active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.role.as_str())
    .bind(user.is_active)
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by(pool, "id", user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;
    Ok(row.get("count"))
}

async fn list_users(pool: &SqlitePool, params: &ListParams) -> Result<(Vec<User>, i64)> {
    let sql = format!(
        "SELECT {} FROM users ORDER BY id LIMIT ? OFFSET ?",
        USER_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    let users = rows.iter().map(row_to_user).collect::<Result<Vec<_>>>()?;
    let total = count_users(pool).await?;
    Ok((users, total))
}

fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        role,
        is_active: row.get("is_active"),
        last_login: row.get("last_login"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
