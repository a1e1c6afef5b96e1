//! Media model
//!
//! Metadata for an uploaded file. The bytes themselves live wherever
//! `file_path` / `url` point; this record only describes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patch::Patch;
use super::validation::{self, ValidationError};

pub const FILENAME_MAX: usize = 255;
pub const PATH_MAX: usize = 500;
pub const URL_MAX: usize = 500;
pub const ALT_TEXT_MAX: usize = 255;

/// Media entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub url: String,
    pub mime_type: String,
    /// Size in bytes
    pub size: i64,
    pub alt_text: Option<String>,
    pub uploader_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Media {
    pub fn new(input: MediaCreate) -> Self {
        Self {
            id: 0,
            filename: input.filename,
            file_path: input.file_path,
            url: input.url,
            mime_type: input.mime_type,
            size: input.size,
            alt_text: input.alt_text,
            uploader_id: input.uploader_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCreate {
    pub filename: String,
    pub file_path: String,
    pub url: String,
    pub mime_type: String,
    pub size: i64,
    #[serde(default)]
    pub alt_text: Option<String>,
    pub uploader_id: i64,
}

impl MediaCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("filename", &self.filename, FILENAME_MAX)?;
        validation::required("file_path", &self.file_path, PATH_MAX)?;
        validation::required("url", &self.url, URL_MAX)?;
        validation::mime_type("mime_type", &self.mime_type)?;
        validation::non_negative("size", self.size)?;
        validation::optional_max_len("alt_text", self.alt_text.as_deref(), ALT_TEXT_MAX)?;
        Ok(())
    }
}

/// Only descriptive metadata can change after upload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaUpdate {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub alt_text: Patch<String>,
}

impl MediaUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref filename) = self.filename {
            validation::required("filename", filename, FILENAME_MAX)?;
        }
        validation::optional_max_len(
            "alt_text",
            self.alt_text.as_set().map(String::as_str),
            ALT_TEXT_MAX,
        )?;
        Ok(())
    }

    pub fn apply_to(self, media: &mut Media) {
        if let Some(filename) = self.filename {
            media.filename = filename;
        }
        self.alt_text.apply_to(&mut media.alt_text);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaResponse {
    pub id: i64,
    pub filename: String,
    pub file_path: String,
    pub url: String,
    pub mime_type: String,
    pub size: i64,
    pub alt_text: Option<String>,
    pub uploader_id: i64,
    pub created_at: String,
}

impl From<Media> for MediaResponse {
    fn from(media: Media) -> Self {
        Self {
            id: media.id,
            filename: media.filename,
            file_path: media.file_path,
            url: media.url,
            mime_type: media.mime_type,
            size: media.size,
            alt_text: media.alt_text,
            uploader_id: media.uploader_id,
            created_at: media.created_at.to_rfc3339(),
        }
    }
}
