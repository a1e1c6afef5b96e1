//! User service
//!
//! Account management and credential checks:
//! - create / update with username and email uniqueness
//! - argon2 hashing of every supplied password
//! - login that stamps `last_login`
//! - refusal to delete users that still own content
//! - optional bootstrap administrator on an empty database

use crate::config::AdminConfig;
use crate::db::repositories::UserRepository;
use crate::models::{ListParams, PagedResult, User, UserCreate, UserLogin, UserRole, UserUpdate};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::password::{hash_password, verify_password};
use chrono::Utc;
use std::sync::Arc;

const ENTITY: &str = "User";

/// Shared message so a caller cannot tell unknown users from bad passwords
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// User service
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: UserCreate) -> ServiceResult<User> {
        input.validate()?;

        if self.repo.exists_by_username(&input.username).await? {
            return Err(ServiceError::duplicate(ENTITY, "username", input.username));
        }
        if self.repo.exists_by_email(&input.email).await? {
            return Err(ServiceError::duplicate(ENTITY, "email", input.email));
        }

        let hash = hash_password(&input.password)?;
        let user = User::new(&input, hash);
        let user = self.repo.create(&user).await.map_err(|err| write_failed(err, &user))?;
        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<User> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn list(&self, params: &ListParams) -> ServiceResult<PagedResult<User>> {
        let (users, total) = self.repo.list(params).await?;
        Ok(PagedResult::new(users, total, params))
    }

    /// Apply a partial update. Only supplied fields change; a new password
    /// is hashed before it is stored.
    pub async fn update(&self, id: i64, input: UserUpdate) -> ServiceResult<User> {
        input.validate()?;
        let mut user = self.get(id).await?;

        if let Some(ref username) = input.username {
            if let Some(other) = self.repo.get_by_username(username).await? {
                if other.id != id {
                    return Err(ServiceError::duplicate(ENTITY, "username", username.clone()));
                }
            }
        }
        if let Some(ref email) = input.email {
            if let Some(other) = self.repo.get_by_email(email).await? {
                if other.id != id {
                    return Err(ServiceError::duplicate(ENTITY, "email", email.clone()));
                }
            }
        }

        input.apply_to(&mut user);
        if let Some(ref password) = input.password {
            user.password_hash = hash_password(password)?;
        }

        let updated = self.repo.update(&user).await.map_err(|err| write_failed(err, &user))?;
        tracing::debug!("Updated user {}", id);
        Ok(updated)
    }

    /// Delete a user that owns no posts, pages, categories or media
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;

        let owned = self.repo.count_owned_content(id).await?;
        if owned > 0 {
            return Err(ServiceError::HasDependents {
                entity: ENTITY,
                id,
                reason: format!(
                    "user owns {} post(s), page(s), categor(ies) or media item(s)",
                    owned
                ),
            });
        }

        self.repo.delete(id).await?;
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Verify credentials and record the login time
    pub async fn authenticate(&self, input: UserLogin) -> ServiceResult<User> {
        let Some(mut user) = self.repo.get_by_username(&input.username).await? else {
            tracing::warn!("Login rejected for unknown user {}", input.username);
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        };

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::warn!("Login rejected for {}: wrong password", user.username);
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        if !user.is_active {
            tracing::warn!("Login rejected for {}: account inactive", user.username);
            return Err(ServiceError::Authentication("Account is inactive".to_string()));
        }

        let now = Utc::now();
        self.repo.update_last_login(user.id, now).await?;
        user.last_login = Some(now);

        tracing::info!("User {} logged in", user.username);
        Ok(user)
    }

    /// Create the configured administrator when the user table is empty.
    ///
    /// Returns the new account, or `None` when nothing was configured or
    /// users already exist.
    pub async fn ensure_bootstrap_admin(&self, admin: &AdminConfig) -> ServiceResult<Option<User>> {
        let Some((username, email, password)) = admin.credentials() else {
            return Ok(None);
        };
        if self.repo.count().await? > 0 {
            tracing::debug!("Users exist, skipping bootstrap administrator");
            return Ok(None);
        }

        let user = self
            .create(UserCreate {
                username: username.to_string(),
                email: email.to_string(),
                password: password.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                role: UserRole::Admin,
            })
            .await?;
        tracing::info!("Bootstrap administrator '{}' created", user.username);
        Ok(Some(user))
    }
}

/// Unique columns can still collide after the pre-checks under concurrent writes
fn write_failed(err: anyhow::Error, user: &User) -> ServiceError {
    ServiceError::from_write(
        ENTITY,
        err,
        &[("username", user.username.as_str()), ("email", user.email.as_str())],
    )
}
