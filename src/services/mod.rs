//! Services layer - Business logic
//!
//! Services sit between the API and the repositories. They are responsible for:
//! - Validating payloads before anything is written
//! - Uniqueness, reference and hierarchy checks
//! - Applying partial updates and deletion policy

pub mod category;
pub mod comment;
pub mod error;
pub mod media;
pub mod page;
pub mod password;
pub mod post;
pub mod tag;
pub mod user;

pub use category::CategoryService;
pub use comment::CommentService;
pub use error::{ServiceError, ServiceResult};
pub use media::MediaService;
pub use page::PageService;
pub use password::{hash_password, verify_password};
pub use post::PostService;
pub use tag::TagService;
pub use user::UserService;

/// Fail with the first missing id, if any
pub(crate) fn reject_missing(field: &'static str, missing: Vec<i64>) -> ServiceResult<()> {
    match missing.first() {
        Some(&id) => Err(ServiceError::InvalidReference { field, id }),
        None => Ok(()),
    }
}
