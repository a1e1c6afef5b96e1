//! Post model
//!
//! This module provides:
//! - `Post` entity with its category and tag id sets
//! - `ContentStatus`, the publication state shared by posts and pages
//! - Create / Update / Response schemas

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patch::Patch;
use super::validation::{self, ValidationError};

pub const TITLE_MAX: usize = 200;
pub const SLUG_MAX: usize = 200;
pub const EXCERPT_MAX: usize = 500;
pub const URL_MAX: usize = 500;
pub const META_TITLE_MAX: usize = 200;
pub const META_DESCRIPTION_MAX: usize = 300;
pub const KEYWORD_MAX: usize = 100;

/// Publication status for posts and pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    /// Not visible to the public
    #[default]
    Draft,
    Published,
    /// Hidden but kept
    Archived,
}

impl ContentStatus {
    /// Convert status to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(ContentStatus::Draft),
            "published" => Ok(ContentStatus::Published),
            "archived" => Ok(ContentStatus::Archived),
            _ => Err(ValidationError::new(
                "status",
                format!("Invalid content status: {}", s),
            )),
        }
    }
}

/// Stamp `published_at` the first time content enters `Published`.
pub(crate) fn stamp_published(
    status: ContentStatus,
    published_at: &mut Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) {
    if status == ContentStatus::Published && published_at.is_none() {
        *published_at = Some(now);
    }
}

/// Validate a list of SEO keywords
pub(crate) fn validate_keywords(keywords: &[String]) -> Result<(), ValidationError> {
    for keyword in keywords {
        validation::required("seo_keywords", keyword, KEYWORD_MAX)?;
    }
    Ok(())
}

/// Sort and de-duplicate a relation id list
pub(crate) fn normalize_ids(mut ids: Vec<i64>) -> Vec<i64> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Post entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image_url: Option<String>,
    pub status: ContentStatus,
    pub is_featured: bool,
    pub view_count: i64,
    pub author_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub seo_keywords: Vec<String>,
    /// Linked categories, ascending
    pub category_ids: Vec<i64>,
    /// Linked tags, ascending
    pub tag_ids: Vec<i64>,
}

impl Post {
    /// Build an unsaved post. The id is assigned by the database.
    pub fn new(input: PostCreate) -> Self {
        let now = Utc::now();
        let mut published_at = None;
        stamp_published(input.status, &mut published_at, now);

        Self {
            id: 0,
            title: input.title,
            slug: input.slug,
            excerpt: input.excerpt,
            content: input.content,
            featured_image_url: input.featured_image_url,
            status: input.status,
            is_featured: input.is_featured,
            view_count: 0,
            author_id: input.author_id,
            published_at,
            created_at: now,
            updated_at: now,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            seo_keywords: input.seo_keywords,
            category_ids: normalize_ids(input.category_ids),
            tag_ids: normalize_ids(input.tag_ids),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCreate {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub featured_image_url: Option<String>,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub is_featured: bool,
    pub author_id: i64,
    #[serde(default)]
    pub category_ids: Vec<i64>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub seo_keywords: Vec<String>,
}

impl PostCreate {
    /// Minimal payload; every optional field takes its default
    pub fn new(title: impl Into<String>, slug: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            excerpt: String::new(),
            content: String::new(),
            featured_image_url: None,
            status: ContentStatus::Draft,
            is_featured: false,
            author_id,
            category_ids: Vec::new(),
            tag_ids: Vec::new(),
            meta_title: None,
            meta_description: None,
            seo_keywords: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("title", &self.title, TITLE_MAX)?;
        validation::slug("slug", &self.slug, SLUG_MAX)?;
        validation::max_len("excerpt", &self.excerpt, EXCERPT_MAX)?;
        validation::optional_max_len("featured_image_url", self.featured_image_url.as_deref(), URL_MAX)?;
        validation::optional_max_len("meta_title", self.meta_title.as_deref(), META_TITLE_MAX)?;
        validation::optional_max_len(
            "meta_description",
            self.meta_description.as_deref(),
            META_DESCRIPTION_MAX,
        )?;
        validation::ids("category_ids", &self.category_ids)?;
        validation::ids("tag_ids", &self.tag_ids)?;
        validate_keywords(&self.seo_keywords)?;
        Ok(())
    }
}

/// Partial update for a post. `category_ids` / `tag_ids`, when present,
/// replace the whole relation set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub featured_image_url: Patch<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    #[serde(default)]
    pub is_featured: Option<bool>,
    #[serde(default)]
    pub category_ids: Option<Vec<i64>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub meta_title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub meta_description: Patch<String>,
    #[serde(default)]
    pub seo_keywords: Option<Vec<String>>,
}

impl PostUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            validation::required("title", title, TITLE_MAX)?;
        }
        if let Some(ref slug) = self.slug {
            validation::slug("slug", slug, SLUG_MAX)?;
        }
        validation::optional_max_len("excerpt", self.excerpt.as_deref(), EXCERPT_MAX)?;
        validation::optional_max_len(
            "featured_image_url",
            self.featured_image_url.as_set().map(String::as_str),
            URL_MAX,
        )?;
        validation::optional_max_len(
            "meta_title",
            self.meta_title.as_set().map(String::as_str),
            META_TITLE_MAX,
        )?;
        validation::optional_max_len(
            "meta_description",
            self.meta_description.as_set().map(String::as_str),
            META_DESCRIPTION_MAX,
        )?;
        if let Some(ref ids) = self.category_ids {
            validation::ids("category_ids", ids)?;
        }
        if let Some(ref ids) = self.tag_ids {
            validation::ids("tag_ids", ids)?;
        }
        if let Some(ref keywords) = self.seo_keywords {
            validate_keywords(keywords)?;
        }
        Ok(())
    }

    pub fn apply_to(self, post: &mut Post, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(slug) = self.slug {
            post.slug = slug;
        }
        if let Some(excerpt) = self.excerpt {
            post.excerpt = excerpt;
        }
        if let Some(content) = self.content {
            post.content = content;
        }
        self.featured_image_url.apply_to(&mut post.featured_image_url);
        if let Some(status) = self.status {
            post.status = status;
            stamp_published(status, &mut post.published_at, now);
        }
        if let Some(is_featured) = self.is_featured {
            post.is_featured = is_featured;
        }
        if let Some(ids) = self.category_ids {
            post.category_ids = normalize_ids(ids);
        }
        if let Some(ids) = self.tag_ids {
            post.tag_ids = normalize_ids(ids);
        }
        self.meta_title.apply_to(&mut post.meta_title);
        self.meta_description.apply_to(&mut post.meta_description);
        if let Some(keywords) = self.seo_keywords {
            post.seo_keywords = keywords;
        }
        post.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub featured_image_url: Option<String>,
    pub status: ContentStatus,
    pub is_featured: bool,
    pub view_count: i64,
    pub author_id: i64,
    pub category_ids: Vec<i64>,
    pub tag_ids: Vec<i64>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub seo_keywords: Vec<String>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            excerpt: post.excerpt,
            content: post.content,
            featured_image_url: post.featured_image_url,
            status: post.status,
            is_featured: post.is_featured,
            view_count: post.view_count,
            author_id: post.author_id,
            category_ids: post.category_ids,
            tag_ids: post.tag_ids,
            published_at: post.published_at.map(|dt| dt.to_rfc3339()),
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
            meta_title: post.meta_title,
            meta_description: post.meta_description,
            seo_keywords: post.seo_keywords,
        }
    }
}

/// Filters for listing posts
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PostFilter {
    #[serde(default)]
    pub status: Option<ContentStatus>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub tag_id: Option<i64>,
    #[serde(default)]
    pub author_id: Option<i64>,
}
