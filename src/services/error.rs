//! Errors shared by every service

use crate::db::repositories::ConstraintViolation;
use crate::models::ValidationError;

/// Failure of a service operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Payload violated a field constraint
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A unique field already holds this value
    #[error("{entity} with {field} '{value}' already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A referenced record does not exist
    #[error("Referenced {field} {id} does not exist")]
    InvalidReference { field: &'static str, id: i64 },

    /// Parent assignment would make a record its own ancestor
    #[error("{entity} {id} cannot be moved below itself or one of its descendants")]
    CircularReference { entity: &'static str, id: i64 },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Deletion refused while other records depend on the target
    #[error("{entity} {id} cannot be deleted: {reason}")]
    HasDependents {
        entity: &'static str,
        id: i64,
        reason: String,
    },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Storage or hashing failure
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn duplicate(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Classify a failed insert or update.
    ///
    /// A UNIQUE violation on one of `unique_fields` (column, written value)
    /// becomes [`ServiceError::Duplicate`]; anything else stays internal.
    pub fn from_write(
        entity: &'static str,
        err: anyhow::Error,
        unique_fields: &[(&'static str, &str)],
    ) -> Self {
        if let Some(ConstraintViolation::Unique { column, .. }) = ConstraintViolation::find(&err) {
            if let Some(&(field, value)) = unique_fields.iter().find(|&&(field, _)| field == column) {
                return Self::duplicate(entity, field, value);
            }
        }
        Self::Internal(err)
    }
}

/// Convenience alias for service results
pub type ServiceResult<T> = Result<T, ServiceError>;
