//! Tag model
//!
//! Tags cut across categories and attach to both posts and pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patch::Patch;
use super::validation::{self, ValidationError};

pub const NAME_MAX: usize = 50;
pub const SLUG_MAX: usize = 50;
pub const DESCRIPTION_MAX: usize = 200;

/// Tag entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Display color as `#RGB` or `#RRGGBB`
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(input: TagCreate) -> Self {
        Self {
            id: 0,
            name: input.name,
            slug: input.slug,
            description: input.description,
            color: input.color,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagCreate {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl TagCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name, NAME_MAX)?;
        validation::slug("slug", &self.slug, SLUG_MAX)?;
        validation::max_len("description", &self.description, DESCRIPTION_MAX)?;
        if let Some(ref color) = self.color {
            validation::hex_color("color", color)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub color: Patch<String>,
}

impl TagUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            validation::required("name", name, NAME_MAX)?;
        }
        if let Some(ref slug) = self.slug {
            validation::slug("slug", slug, SLUG_MAX)?;
        }
        validation::optional_max_len("description", self.description.as_deref(), DESCRIPTION_MAX)?;
        if let Some(color) = self.color.as_set() {
            validation::hex_color("color", color)?;
        }
        Ok(())
    }

    pub fn apply_to(self, tag: &mut Tag) {
        if let Some(name) = self.name {
            tag.name = name;
        }
        if let Some(slug) = self.slug {
            tag.slug = slug;
        }
        if let Some(description) = self.description {
            tag.description = description;
        }
        self.color.apply_to(&mut tag.color);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub color: Option<String>,
    pub created_at: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            slug: tag.slug,
            description: tag.description,
            color: tag.color,
            created_at: tag.created_at.to_rfc3339(),
        }
    }
}
