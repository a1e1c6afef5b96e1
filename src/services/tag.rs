//! Tag service

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagCreate, TagUpdate};
use crate::services::error::{ServiceError, ServiceResult};
use std::sync::Arc;

const ENTITY: &str = "Tag";

/// Tag service
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, input: TagCreate) -> ServiceResult<Tag> {
        input.validate()?;

        if self.repo.exists_by_name(&input.name).await? {
            return Err(ServiceError::duplicate(ENTITY, "name", input.name));
        }
        if self.repo.exists_by_slug(&input.slug).await? {
            return Err(ServiceError::duplicate(ENTITY, "slug", input.slug));
        }

        let tag = Tag::new(input);
        let tag = self.repo.create(&tag).await.map_err(|err| write_failed(err, &tag))?;
        tracing::debug!("Created tag {} ({})", tag.slug, tag.id);
        Ok(tag)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Tag> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn list(&self) -> ServiceResult<Vec<Tag>> {
        Ok(self.repo.list().await?)
    }

    pub async fn update(&self, id: i64, input: TagUpdate) -> ServiceResult<Tag> {
        input.validate()?;
        let mut tag = self.get(id).await?;

        if let Some(ref name) = input.name {
            if *name != tag.name && self.repo.exists_by_name(name).await? {
                return Err(ServiceError::duplicate(ENTITY, "name", name.clone()));
            }
        }
        if let Some(ref slug) = input.slug {
            if *slug != tag.slug && self.repo.exists_by_slug(slug).await? {
                return Err(ServiceError::duplicate(ENTITY, "slug", slug.clone()));
            }
        }

        input.apply_to(&mut tag);
        self.repo.update(&tag).await.map_err(|err| write_failed(err, &tag))
    }

    /// Delete a tag; its post and page links go with it
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.repo.delete(id).await?;
        tracing::info!("Deleted tag {}", id);
        Ok(())
    }
}

/// A concurrent writer can claim a name or slug between the check and the write
fn write_failed(err: anyhow::Error, tag: &Tag) -> ServiceError {
    ServiceError::from_write(
        ENTITY,
        err,
        &[("name", tag.name.as_str()), ("slug", tag.slug.as_str())],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::test_support::migrated_pool;
    use crate::models::Patch;

    async fn setup_test_service() -> TagService {
        let pool = migrated_pool().await;
        TagService::new(SqlxTagRepository::boxed(pool))
    }

    fn input(name: &str, color: Option<&str>) -> TagCreate {
        TagCreate {
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: String::new(),
            color: color.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let service = setup_test_service().await;
        service.create(input("Rust", Some("#f74c00"))).await.unwrap();
        service.create(input("Axum", None)).await.unwrap();

        let names: Vec<String> = service.list().await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Axum", "Rust"]);
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let service = setup_test_service().await;
        service.create(input("Rust", None)).await.unwrap();
        let err = service.create(input("Rust", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate { field: "name", .. }));
    }

    #[tokio::test]
    async fn test_concurrent_create_reports_duplicate() {
        let service = setup_test_service().await;
        let (first, second) = tokio::join!(
            service.create(input("Rust", None)),
            service.create(input("Rust", None))
        );

        let (created, err) = match (first, second) {
            (Ok(tag), Err(err)) | (Err(err), Ok(tag)) => (tag, err),
            other => panic!("expected one success and one failure, got {:?}", other),
        };
        assert_eq!(created.slug, "rust");
        assert!(matches!(err, ServiceError::Duplicate { entity: "Tag", .. }), "{:?}", err);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    /// Reports every name and slug as free, like a writer that lost the race
    struct StaleChecks(SqlxTagRepository);

    #[async_trait::async_trait]
    impl TagRepository for StaleChecks {
        async fn create(&self, tag: &Tag) -> anyhow::Result<Tag> {
            self.0.create(tag).await
        }
        async fn get_by_id(&self, id: i64) -> anyhow::Result<Option<Tag>> {
            self.0.get_by_id(id).await
        }
        async fn get_by_slug(&self, slug: &str) -> anyhow::Result<Option<Tag>> {
            self.0.get_by_slug(slug).await
        }
        async fn list(&self) -> anyhow::Result<Vec<Tag>> {
            self.0.list().await
        }
        async fn update(&self, tag: &Tag) -> anyhow::Result<Tag> {
            self.0.update(tag).await
        }
        async fn delete(&self, id: i64) -> anyhow::Result<()> {
            self.0.delete(id).await
        }
        async fn exists_by_name(&self, _name: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn exists_by_slug(&self, _slug: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
        async fn missing_ids(&self, ids: &[i64]) -> anyhow::Result<Vec<i64>> {
            self.0.missing_ids(ids).await
        }
    }

    #[tokio::test]
    async fn test_unique_constraint_maps_to_duplicate() {
        let pool = migrated_pool().await;
        let service = TagService::new(Arc::new(StaleChecks(SqlxTagRepository::new(pool))));
        service.create(input("Rust", None)).await.unwrap();

        let mut same_slug = input("Rustlang", None);
        same_slug.slug = "rust".to_string();
        let err = service.create(same_slug).await.unwrap_err();
        assert!(
            matches!(err, ServiceError::Duplicate { field: "slug", ref value, .. } if value == "rust"),
            "{:?}",
            err
        );

        let other = service.create(input("Axum", None)).await.unwrap();
        let err = service
            .update(
                other.id,
                TagUpdate {
                    name: Some("Rust".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate { field: "name", .. }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_bad_color_rejected() {
        let service = setup_test_service().await;
        let err = service.create(input("Rust", Some("orange"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "color"));
    }

    #[tokio::test]
    async fn test_update_color_tri_state() {
        let service = setup_test_service().await;
        let tag = service.create(input("Rust", Some("#fff"))).await.unwrap();

        let renamed = service
            .update(
                tag.id,
                TagUpdate {
                    description: Some("Systems language".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.color.as_deref(), Some("#fff"));

        let cleared = service
            .update(
                tag.id,
                TagUpdate {
                    color: Patch::Null,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(cleared.color.is_none());
        assert_eq!(cleared.description, "Systems language");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let service = setup_test_service().await;
        let err = service.delete(7).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }
}
