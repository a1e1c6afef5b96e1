//! Media service
//!
//! Records metadata for uploaded files. The configured size limit and MIME
//! allow-list are enforced on create.

use crate::config::MediaConfig;
use crate::db::repositories::{ConstraintViolation, MediaRepository, UserRepository};
use crate::models::{ListParams, Media, MediaCreate, MediaUpdate, PagedResult, ValidationError};
use crate::services::error::{ServiceError, ServiceResult};
use std::sync::Arc;

const ENTITY: &str = "Media";

/// Media service
pub struct MediaService {
    media: Arc<dyn MediaRepository>,
    users: Arc<dyn UserRepository>,
    config: MediaConfig,
}

impl MediaService {
    pub fn new(
        media: Arc<dyn MediaRepository>,
        users: Arc<dyn UserRepository>,
        config: MediaConfig,
    ) -> Self {
        Self {
            media,
            users,
            config,
        }
    }

    pub async fn create(&self, input: MediaCreate) -> ServiceResult<Media> {
        input.validate()?;

        if !self.config.is_type_allowed(&input.mime_type) {
            return Err(ValidationError::new(
                "mime_type",
                format!("File type not allowed: {}", input.mime_type),
            )
            .into());
        }
        if !self.config.is_size_allowed(input.size) {
            return Err(ValidationError::new(
                "size",
                format!("File exceeds the {} byte limit", self.config.max_file_size),
            )
            .into());
        }
        self.ensure_uploader(input.uploader_id).await?;

        let media = Media::new(input);
        let media = match self.media.create(&media).await {
            Ok(created) => created,
            Err(err) => return Err(self.write_failed(err, &media).await),
        };
        tracing::debug!("Recorded media {} ({})", media.filename, media.id);
        Ok(media)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Media> {
        self.media
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ENTITY, id))
    }

    pub async fn list(&self, params: &ListParams) -> ServiceResult<PagedResult<Media>> {
        let (items, total) = self.media.list(params).await?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn update(&self, id: i64, input: MediaUpdate) -> ServiceResult<Media> {
        input.validate()?;
        let mut media = self.get(id).await?;
        input.apply_to(&mut media);
        Ok(self.media.update(&media).await?)
    }

    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        self.get(id).await?;
        self.media.delete(id).await?;
        tracing::info!("Deleted media {}", id);
        Ok(())
    }

    /// The uploader can be deleted between the check and the insert
    async fn write_failed(&self, err: anyhow::Error, media: &Media) -> ServiceError {
        if ConstraintViolation::find(&err) == Some(ConstraintViolation::ForeignKey) {
            if let Err(reference) = self.ensure_uploader(media.uploader_id).await {
                return reference;
            }
        }
        ServiceError::Internal(err)
    }

    async fn ensure_uploader(&self, uploader_id: i64) -> ServiceResult<()> {
        if self.users.get_by_id(uploader_id).await?.is_none() {
            return Err(ServiceError::InvalidReference {
                field: "uploader_id",
                id: uploader_id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxMediaRepository, SqlxUserRepository};
    use crate::db::test_support::{migrated_pool, seed_user};
    use crate::models::Patch;

    async fn setup_test_service(config: MediaConfig) -> (MediaService, i64) {
        let pool = migrated_pool().await;
        let uploader = seed_user(&pool, "uploader").await;
        let service = MediaService::new(
            SqlxMediaRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool),
            config,
        );
        (service, uploader)
    }

    fn input(mime_type: &str, size: i64, uploader_id: i64) -> MediaCreate {
        MediaCreate {
            filename: "photo.png".to_string(),
            file_path: "uploads/photo.png".to_string(),
            url: "/uploads/photo.png".to_string(),
            mime_type: mime_type.to_string(),
            size,
            alt_text: None,
            uploader_id,
        }
    }

    #[tokio::test]
    async fn test_create_within_limits() {
        let (service, uploader) = setup_test_service(MediaConfig::default()).await;
        let media = service.create(input("image/png", 1024, uploader)).await.unwrap();
        assert_eq!(media.size, 1024);
        assert_eq!(service.get(media.id).await.unwrap(), media);
    }

    #[tokio::test]
    async fn test_type_and_size_limits() {
        let config = MediaConfig {
            max_file_size: 100,
            allowed_types: vec!["image/png".to_string()],
        };
        let (service, uploader) = setup_test_service(config).await;

        let err = service.create(input("video/mp4", 10, uploader)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "mime_type"));

        let err = service.create(input("image/png", 101, uploader)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref v) if v.field == "size"));

        assert!(service.create(input("image/png", 100, uploader)).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_uploader() {
        let (service, uploader) = setup_test_service(MediaConfig::default()).await;
        let err = service
            .create(input("image/png", 1, uploader + 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidReference { field: "uploader_id", .. }));
    }

    #[tokio::test]
    async fn test_uploader_deleted_before_write() {
        let (service, uploader) = setup_test_service(MediaConfig::default()).await;
        let media = Media::new(input("image/png", 1, uploader));
        service.users.delete(uploader).await.unwrap();

        let err = service.media.create(&media).await.unwrap_err();
        assert!(matches!(
            service.write_failed(err, &media).await,
            ServiceError::InvalidReference { field: "uploader_id", id } if id == uploader
        ));
    }

    #[tokio::test]
    async fn test_update_alt_text() {
        let (service, uploader) = setup_test_service(MediaConfig::default()).await;
        let media = service.create(input("image/png", 1, uploader)).await.unwrap();

        let update = MediaUpdate {
            alt_text: Patch::Set("A sunset".to_string()),
            ..Default::default()
        };
        let updated = service.update(media.id, update).await.unwrap();
        assert_eq!(updated.alt_text.as_deref(), Some("A sunset"));
        assert_eq!(updated.filename, "photo.png");
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let (service, uploader) = setup_test_service(MediaConfig::default()).await;
        let media = service.create(input("image/png", 1, uploader)).await.unwrap();
        assert_eq!(service.list(&ListParams::default()).await.unwrap().total, 1);

        service.delete(media.id).await.unwrap();
        assert_eq!(service.list(&ListParams::default()).await.unwrap().total, 0);
    }
}
