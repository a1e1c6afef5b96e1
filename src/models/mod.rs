//! Data models
//!
//! This module contains the entities and transfer schemas of the content store.
//! Models represent:
//! - Database entities (User, Category, Tag, Post, Page, Comment, Media)
//! - Many-to-many edge records
//! - Create / Update / Response schemas with their validation rules
//! - Shared building blocks: tri-state patches, pagination, parent-pointer trees

pub mod association;
mod category;
mod comment;
mod media;
mod page;
mod pagination;
mod patch;
mod post;
mod tag;
pub mod tree;
mod user;
pub mod validation;

pub use association::{Edge, PageTagLink, PostCategoryLink, PostTagLink};
pub use category::{Category, CategoryCreate, CategoryResponse, CategoryTree, CategoryUpdate};
pub use comment::{Comment, CommentCreate, CommentResponse, CommentThread, CommentUpdate};
pub use media::{Media, MediaCreate, MediaResponse, MediaUpdate};
pub use page::{Page, PageCreate, PageResponse, PageTree, PageUpdate};
pub use pagination::{ListParams, PagedResult, MAX_PER_PAGE};
pub use patch::Patch;
pub use post::{ContentStatus, Post, PostCreate, PostFilter, PostResponse, PostUpdate};
pub use tag::{Tag, TagCreate, TagResponse, TagUpdate};
pub use tree::{build_forest, ParentMap, TreeItem, TreeNode};
pub use user::{User, UserCreate, UserLogin, UserResponse, UserRole, UserUpdate};
pub use validation::ValidationError;
