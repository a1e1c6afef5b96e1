//! Comment service
//!
//! Comments belong to a post and may reply to another comment of the same
//! post. New comments start unapproved; the public thread only shows
//! approved comments whose whole ancestor chain is approved.

use crate::db::repositories::{CommentRepository, ConstraintViolation, PostRepository};
use crate::models::{build_forest, Comment, CommentCreate, CommentUpdate, TreeNode, ValidationError};
use crate::services::error::{ServiceError, ServiceResult};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

const ENTITY: &str = "Comment";

/// Comment service
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    pub async fn create(&self, input: CommentCreate) -> ServiceResult<Comment> {
        input.validate()?;

        let comment = Comment::new(input);
        self.check_references(&comment).await?;

        let comment = match self.comments.create(&comment).await {
            Ok(created) => created,
            Err(err) => return Err(self.write_failed(err, &comment).await),
        };
        tracing::debug!("Created comment {} on post {}", comment.id, comment.post_id);
        Ok(comment)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Comment> {
        self.comments
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    /// Edit the text or moderate; post and parent never change
    pub async fn update(&self, id: i64, input: CommentUpdate) -> ServiceResult<Comment> {
        input.validate()?;
        let mut comment = self.get(id).await?;
        input.apply_to(&mut comment, Utc::now());
        match self.comments.update(&comment).await {
            Ok(updated) => Ok(updated),
            Err(err) => Err(self.write_failed(err, &comment).await),
        }
    }

    /// Delete a comment and every reply below it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.comments.delete(id).await?;
        tracing::info!("Deleted comment {}", id);
        Ok(())
    }

    /// Comments of a post as nested threads, oldest first.
    ///
    /// With `approved_only`, a reply is shown only when every comment above
    /// it is approved too.
    pub async fn thread(&self, post_id: i64, approved_only: bool) -> ServiceResult<Vec<TreeNode<Comment>>> {
        if self.posts.get_by_id(post_id).await?.is_none() {
            return Err(ServiceError::not_found("Post", post_id));
        }

        let mut comments = self.comments.list_by_post(post_id, approved_only).await?;
        if approved_only {
            // Parents are always older than their replies, so one pass suffices
            let mut visible = HashSet::new();
            comments.retain(|c| {
                let keep = c.parent_id.map_or(true, |p| visible.contains(&p));
                if keep {
                    visible.insert(c.id);
                }
                keep
            });
        }
        let forest = build_forest(comments);
        tracing::debug!(
            "Post {} thread: {} comment(s) under {} root(s)",
            post_id,
            forest.iter().map(TreeNode::total_count).sum::<usize>(),
            forest.len()
        );
        Ok(forest)
    }

    async fn check_references(&self, comment: &Comment) -> ServiceResult<()> {
        if self.posts.get_by_id(comment.post_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "post_id",
                id: comment.post_id,
            });
        }

        if let Some(parent_id) = comment.parent_id {
            let parent = self.comments.get_by_id(parent_id).await?.ok_or(
                ServiceError::InvalidReference {
                    field: "parent_id",
                    id: parent_id,
                },
            )?;
            if parent.post_id != comment.post_id {
                return Err(ValidationError::new(
                    "parent_id",
                    "reply must belong to the same post as its parent",
                )
                .into());
            }
        }
        Ok(())
    }

    /// The post or parent can be deleted between the checks and the write
    async fn write_failed(&self, err: anyhow::Error, comment: &Comment) -> ServiceError {
        if ConstraintViolation::find(&err) == Some(ConstraintViolation::ForeignKey) {
            if let Err(reference) = self.check_references(comment).await {
                return reference;
            }
        }
        ServiceError::Internal(err)
    }
}
