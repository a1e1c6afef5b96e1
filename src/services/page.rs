//! Page service
//!
//! Pages have an author, an optional category, an optional parent page and
//! any number of tags. The page hierarchy stays a forest: a page cannot be
//! moved below itself and a page with children cannot be deleted.

use crate::db::repositories::{
    CategoryRepository, ConstraintViolation, PageRepository, TagRepository, UserRepository,
};
use crate::models::{build_forest, ListParams, Page, PageCreate, PageUpdate, PagedResult, TreeNode};
use crate::services::error::{ServiceError, ServiceResult};
use crate::services::reject_missing;
use chrono::Utc;
use std::sync::Arc;

const ENTITY: &str = "Page";

/// Page service
pub struct PageService {
    pages: Arc<dyn PageRepository>,
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    tags: Arc<dyn TagRepository>,
}

impl PageService {
    pub fn new(
        pages: Arc<dyn PageRepository>,
        users: Arc<dyn UserRepository>,
        categories: Arc<dyn CategoryRepository>,
        tags: Arc<dyn TagRepository>,
    ) -> Self {
        Self {
            pages,
            users,
            categories,
            tags,
        }
    }

    pub async fn create(&self, input: PageCreate) -> ServiceResult<Page> {
        input.validate()?;

        if self.pages.exists_by_slug(&input.slug).await? {
            return Err(ServiceError::duplicate(ENTITY, "slug", input.slug));
        }

        let page = Page::new(input);
        self.check_references(&page).await?;

        let created = match self.pages.create(&page).await {
            Ok(created) => created,
            Err(err) => return Err(self.write_failed(err, &page).await),
        };
        tracing::debug!("Created page {} ({})", created.slug, created.id);
        Ok(created)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Page> {
        self.pages
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> ServiceResult<Page> {
        self.pages
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, slug))
    }

    pub async fn list(&self, params: &ListParams) -> ServiceResult<PagedResult<Page>> {
        let (pages, total) = self.pages.list(params).await?;
        Ok(PagedResult::new(pages, total, params))
    }

    /// Every page nested under its parent; siblings by `sort_order`
    pub async fn tree(&self) -> ServiceResult<Vec<TreeNode<Page>>> {
        Ok(build_forest(self.pages.list_all().await?))
    }

    pub async fn update(&self, id: i64, input: PageUpdate) -> ServiceResult<Page> {
        input.validate()?;
        let mut page = self.get(id).await?;

        if let Some(ref slug) = input.slug {
            if self.pages.exists_by_slug_excluding(slug, id).await? {
                return Err(ServiceError::duplicate(ENTITY, "slug", slug.clone()));
            }
        }
        if let Some(&parent_id) = input.parent_id.as_set() {
            self.ensure_parent(parent_id).await?;
            if self.pages.parent_map().await?.would_create_cycle(id, parent_id) {
                return Err(ServiceError::CircularReference { entity: ENTITY, id });
            }
        }

        input.apply_to(&mut page, Utc::now());
        self.check_links(page.category_id, &page.tag_ids).await?;

        let updated = match self.pages.update(&page).await {
            Ok(updated) => updated,
            Err(err) => return Err(self.write_failed(err, &page).await),
        };
        tracing::debug!("Updated page {}", id);
        Ok(updated)
    }

    /// Delete a page without child pages; its tag links go with it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;

        let children = self.pages.count_children(id).await?;
        if children > 0 {
            return Err(ServiceError::HasDependents {
                entity: ENTITY,
                id,
                reason: format!("page has {} child page(s)", children),
            });
        }

        self.pages.delete(id).await?;
        tracing::info!("Deleted page {}", id);
        Ok(())
    }

    async fn check_references(&self, page: &Page) -> ServiceResult<()> {
        if self.users.get_by_id(page.author_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "author_id",
                id: page.author_id,
            });
        }
        if let Some(parent_id) = page.parent_id {
            self.ensure_parent(parent_id).await?;
        }
        self.check_links(page.category_id, &page.tag_ids).await
    }

    /// Repeat the reference checks after a foreign key failure so the
    /// vanished row is named; other failures go through [`ServiceError::from_write`]
    async fn write_failed(&self, err: anyhow::Error, page: &Page) -> ServiceError {
        if ConstraintViolation::find(&err) == Some(ConstraintViolation::ForeignKey) {
            if let Err(reference) = self.check_references(page).await {
                return reference;
            }
        }
        ServiceError::from_write(ENTITY, err, &[("slug", page.slug.as_str())])
    }

    async fn ensure_parent(&self, parent_id: i64) -> ServiceResult<()> {
        if self.pages.get_by_id(parent_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "parent_id",
                id: parent_id,
            });
        }
        Ok(())
    }

    async fn check_links(&self, category_id: Option<i64>, tag_ids: &[i64]) -> ServiceResult<()> {
        if let Some(category_id) = category_id {
            if self.categories.get_by_id(category_id).await?.is_none() {
                return Err(ServiceError::InvalidReference {
                    field: "category_id",
                    id: category_id,
                });
            }
        }
        reject_missing("tag_ids", self.tags.missing_ids(tag_ids).await?)
    }
}
