//! Comment model
//!
//! Comments hang off a post and may reply to another comment on the same
//! post. New comments wait for moderation (`is_approved = false`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::tree::{TreeItem, TreeNode};
use super::validation::{self, ValidationError};

pub const AUTHOR_NAME_MAX: usize = 100;
pub const CONTENT_MAX: usize = 5000;

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    /// Comment this one replies to (`None` for top-level)
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(input: CommentCreate) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            post_id: input.post_id,
            parent_id: input.parent_id,
            author_name: input.author_name,
            author_email: input.author_email,
            content: input.content,
            is_approved: false,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TreeItem for Comment {
    fn node_id(&self) -> i64 {
        self.id
    }

    fn parent_node_id(&self) -> Option<i64> {
        self.parent_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentCreate {
    pub post_id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
}

impl CommentCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("author_name", &self.author_name, AUTHOR_NAME_MAX)?;
        validation::email("author_email", &self.author_email)?;
        validation::required("content", &self.content, CONTENT_MAX)?;
        Ok(())
    }
}

/// Moderation / edit payload. Post and parent are fixed at creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentUpdate {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub is_approved: Option<bool>,
}

impl CommentUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref content) = self.content {
            validation::required("content", content, CONTENT_MAX)?;
        }
        Ok(())
    }

    pub fn apply_to(self, comment: &mut Comment, now: DateTime<Utc>) {
        if let Some(content) = self.content {
            comment.content = content;
        }
        if let Some(is_approved) = self.is_approved {
            comment.is_approved = is_approved;
        }
        comment.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            author_name: comment.author_name,
            author_email: comment.author_email,
            content: comment.content,
            is_approved: comment.is_approved,
            created_at: comment.created_at.to_rfc3339(),
            updated_at: comment.updated_at.to_rfc3339(),
        }
    }
}

/// A top-level comment with its nested replies
pub type CommentThread = TreeNode<CommentResponse>;

impl From<TreeNode<Comment>> for CommentThread {
    fn from(node: TreeNode<Comment>) -> Self {
        node.map(CommentResponse::from)
    }
}
