//! User model
//!
//! Users own posts, pages and uploaded media. The plaintext credential only
//! ever appears in [`UserCreate`], [`UserUpdate`] and [`UserLogin`]; the
//! stored record keeps the argon2 hash and never serializes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::validation::{self, ValidationError};

pub const USERNAME_MAX: usize = 50;
pub const NAME_MAX: usize = 100;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 255;

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build an unsaved user from a validated create payload and a
    /// precomputed hash. The id is assigned by the database.
    pub fn new(input: &UserCreate, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            role: input.role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Closed set of user roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Editor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            _ => Err(ValidationError::new("role", format!("Invalid user role: {}", s))),
        }
    }
}

/// Payload for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    /// Plaintext; hashed before storage
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl UserCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("username", &self.username, USERNAME_MAX)?;
        validation::email("email", &self.email)?;
        validation::len_between("password", &self.password, PASSWORD_MIN, PASSWORD_MAX)?;
        validation::max_len("first_name", &self.first_name, NAME_MAX)?;
        validation::max_len("last_name", &self.last_name, NAME_MAX)?;
        Ok(())
    }
}

/// Partial update for a user; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// New plaintext password, re-hashed before storage
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref username) = self.username {
            validation::required("username", username, USERNAME_MAX)?;
        }
        if let Some(ref email) = self.email {
            validation::email("email", email)?;
        }
        if let Some(ref password) = self.password {
            validation::len_between("password", password, PASSWORD_MIN, PASSWORD_MAX)?;
        }
        validation::optional_max_len("first_name", self.first_name.as_deref(), NAME_MAX)?;
        validation::optional_max_len("last_name", self.last_name.as_deref(), NAME_MAX)?;
        Ok(())
    }

    /// Copy every supplied profile field onto `user`. The password is not
    /// touched here; hashing belongs to the credential service.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(ref username) = self.username {
            user.username = username.clone();
        }
        if let Some(ref email) = self.email {
            user.email = email.clone();
        }
        if let Some(ref first_name) = self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(is_active) = self.is_active {
            user.is_active = is_active;
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct UserLogin {
    pub username: String,
    pub password: String,
}

/// Outbound representation of a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub is_active: bool,
    pub last_login: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            role: user.role,
            is_active: user.is_active,
            last_login: user.last_login.map(|dt| dt.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        }
    }
}
