//! Category service
//!
//! Categories form a forest through `parent_id`. The service keeps it a
//! forest: parents must exist, a category can never be moved below itself,
//! and a category with children cannot be deleted. Every category records
//! the user who created it.

use crate::db::repositories::{CategoryRepository, ConstraintViolation, UserRepository};
use crate::models::{build_forest, Category, CategoryCreate, CategoryUpdate, TreeNode};
use crate::services::error::{ServiceError, ServiceResult};
use std::sync::Arc;

const ENTITY: &str = "Category";

/// Category service
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    users: Arc<dyn UserRepository>,
}

impl CategoryService {
    pub fn new(repo: Arc<dyn CategoryRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repo, users }
    }

    pub async fn create(&self, input: CategoryCreate) -> ServiceResult<Category> {
        input.validate()?;

        if self.repo.exists_by_name(&input.name).await? {
            return Err(ServiceError::duplicate(ENTITY, "name", input.name));
        }
        if self.repo.exists_by_slug(&input.slug).await? {
            return Err(ServiceError::duplicate(ENTITY, "slug", input.slug));
        }

        let category = Category::new(input);
        self.check_references(&category).await?;
        let category = match self.repo.create(&category).await {
            Ok(created) => created,
            Err(err) => return Err(self.write_failed(err, &category).await),
        };
        tracing::debug!("Created category {} ({})", category.slug, category.id);
        Ok(category)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Category> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Category> {
        self.repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, slug))
    }

    pub async fn list(&self) -> ServiceResult<Vec<Category>> {
        Ok(self.repo.list().await?)
    }

    /// Every category nested under its parent; siblings by name
    pub async fn tree(&self) -> ServiceResult<Vec<TreeNode<Category>>> {
        Ok(build_forest(self.repo.list().await?))
    }

    pub async fn update(&self, id: i64, input: CategoryUpdate) -> ServiceResult<Category> {
        input.validate()?;
        let mut category = self.get(id).await?;

        if let Some(ref name) = input.name {
            if *name != category.name && self.repo.exists_by_name(name).await? {
                return Err(ServiceError::duplicate(ENTITY, "name", name.clone()));
            }
        }
        if let Some(ref slug) = input.slug {
            if *slug != category.slug && self.repo.exists_by_slug(slug).await? {
                return Err(ServiceError::duplicate(ENTITY, "slug", slug.clone()));
            }
        }
        if let Some(&parent_id) = input.parent_id.as_set() {
            self.ensure_exists(parent_id).await?;
            if self.repo.parent_map().await?.would_create_cycle(id, parent_id) {
                return Err(ServiceError::CircularReference { entity: ENTITY, id });
            }
        }

        input.apply_to(&mut category);
        let updated = match self.repo.update(&category).await {
            Ok(updated) => updated,
            Err(err) => return Err(self.write_failed(err, &category).await),
        };
        tracing::debug!("Updated category {}", id);
        Ok(updated)
    }

    /// Delete a leaf category. Post links cascade; pages in it lose their category.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;

        let children = self.repo.get_children(id).await?;
        if !children.is_empty() {
            return Err(ServiceError::HasDependents {
                entity: ENTITY,
                id,
                reason: format!("category has {} child categor(ies)", children.len()),
            });
        }

        self.repo.delete(id).await?;
        tracing::info!("Deleted category {}", id);
        Ok(())
    }

    async fn check_references(&self, category: &Category) -> ServiceResult<()> {
        if let Some(parent_id) = category.parent_id {
            self.ensure_exists(parent_id).await?;
        }
        if self.users.get_by_id(category.created_by_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "created_by_id",
                id: category.created_by_id,
            });
        }
        Ok(())
    }

    /// Classify a rejected write. A foreign key failure means a referenced
    /// row vanished after the checks ran, so they are repeated to name it.
    async fn write_failed(&self, err: anyhow::Error, category: &Category) -> ServiceError {
        if ConstraintViolation::find(&err) == Some(ConstraintViolation::ForeignKey) {
            if let Err(reference) = self.check_references(category).await {
                return reference;
            }
        }
        ServiceError::from_write(
            ENTITY,
            err,
            &[("name", category.name.as_str()), ("slug", category.slug.as_str())],
        )
    }

    async fn ensure_exists(&self, parent_id: i64) -> ServiceResult<()> {
        if self.repo.get_by_id(parent_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "parent_id",
                id: parent_id,
            });
        }
        Ok(())
    }
}
