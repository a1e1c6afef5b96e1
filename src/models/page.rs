//! Page model
//!
//! Pages are standalone documents (about, contact, landing pages). They form
//! their own hierarchy through `parent_id`, may sit in one category and carry
//! tags through `page_tags`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::patch::Patch;
use super::post::{normalize_ids, stamp_published, ContentStatus};
use super::tree::{TreeItem, TreeNode};
use super::validation::{self, ValidationError};

pub const TITLE_MAX: usize = 200;
pub const SLUG_MAX: usize = 200;
pub const TEMPLATE_MAX: usize = 50;
pub const META_TITLE_MAX: usize = 200;
pub const META_DESCRIPTION_MAX: usize = 300;

pub const DEFAULT_TEMPLATE: &str = "default";

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Page entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Template name used by the renderer
    pub template: String,
    pub status: ContentStatus,
    pub is_homepage: bool,
    pub sort_order: i32,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    /// Free-form key/value data for templates
    pub custom_fields: Map<String, Value>,
    pub tag_ids: Vec<i64>,
}

impl Page {
    pub fn new(input: PageCreate) -> Self {
        let now = Utc::now();
        let mut published_at = None;
        stamp_published(input.status, &mut published_at, now);

        Self {
            id: 0,
            title: input.title,
            slug: input.slug,
            content: input.content,
            template: input.template,
            status: input.status,
            is_homepage: input.is_homepage,
            sort_order: input.sort_order,
            author_id: input.author_id,
            category_id: input.category_id,
            parent_id: input.parent_id,
            published_at,
            created_at: now,
            updated_at: now,
            meta_title: input.meta_title,
            meta_description: input.meta_description,
            custom_fields: input.custom_fields,
            tag_ids: normalize_ids(input.tag_ids),
        }
    }
}

impl TreeItem for Page {
    fn node_id(&self) -> i64 {
        self.id
    }

    fn parent_node_id(&self) -> Option<i64> {
        self.parent_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCreate {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub status: ContentStatus,
    #[serde(default)]
    pub is_homepage: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub author_id: i64,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub custom_fields: Map<String, Value>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
}

impl PageCreate {
    pub fn new(title: impl Into<String>, slug: impl Into<String>, author_id: i64) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            content: String::new(),
            template: default_template(),
            status: ContentStatus::Draft,
            is_homepage: false,
            sort_order: 0,
            author_id,
            category_id: None,
            parent_id: None,
            meta_title: None,
            meta_description: None,
            custom_fields: Map::new(),
            tag_ids: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("title", &self.title, TITLE_MAX)?;
        validation::slug("slug", &self.slug, SLUG_MAX)?;
        validation::required("template", &self.template, TEMPLATE_MAX)?;
        validation::optional_max_len("meta_title", self.meta_title.as_deref(), META_TITLE_MAX)?;
        validation::optional_max_len(
            "meta_description",
            self.meta_description.as_deref(),
            META_DESCRIPTION_MAX,
        )?;
        validation::ids("tag_ids", &self.tag_ids)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub status: Option<ContentStatus>,
    #[serde(default)]
    pub is_homepage: Option<bool>,
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub category_id: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub parent_id: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub meta_title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub meta_description: Patch<String>,
    /// Replaces the whole map when present
    #[serde(default)]
    pub custom_fields: Option<Map<String, Value>>,
    #[serde(default)]
    pub tag_ids: Option<Vec<i64>>,
}

impl PageUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref title) = self.title {
            validation::required("title", title, TITLE_MAX)?;
        }
        if let Some(ref slug) = self.slug {
            validation::slug("slug", slug, SLUG_MAX)?;
        }
        if let Some(ref template) = self.template {
            validation::required("template", template, TEMPLATE_MAX)?;
        }
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
        if let Some(ref ids) = self.tag_ids {
            validation::ids("tag_ids", ids)?;
        }
        Ok(())
    }

    pub fn apply_to(self, page: &mut Page, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            page.title = title;
        }
        if let Some(slug) = self.slug {
            page.slug = slug;
        }
        if let Some(content) = self.content {
            page.content = content;
        }
        if let Some(template) = self.template {
            page.template = template;
        }
        if let Some(status) = self.status {
            page.status = status;
            stamp_published(status, &mut page.published_at, now);
        }
        if let Some(is_homepage) = self.is_homepage {
            page.is_homepage = is_homepage;
        }
        if let Some(sort_order) = self.sort_order {
            page.sort_order = sort_order;
        }
        self.category_id.apply_to(&mut page.category_id);
        self.parent_id.apply_to(&mut page.parent_id);
        self.meta_title.apply_to(&mut page.meta_title);
        self.meta_description.apply_to(&mut page.meta_description);
        if let Some(fields) = self.custom_fields {
            page.custom_fields = fields;
        }
        if let Some(ids) = self.tag_ids {
            page.tag_ids = normalize_ids(ids);
        }
        page.updated_at = now;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub template: String,
    pub status: ContentStatus,
    pub is_homepage: bool,
    pub sort_order: i32,
    pub author_id: i64,
    pub category_id: Option<i64>,
    pub parent_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub custom_fields: Map<String, Value>,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        Self {
            id: page.id,
            title: page.title,
            slug: page.slug,
            content: page.content,
            template: page.template,
            status: page.status,
            is_homepage: page.is_homepage,
            sort_order: page.sort_order,
            author_id: page.author_id,
            category_id: page.category_id,
            parent_id: page.parent_id,
            tag_ids: page.tag_ids,
            published_at: page.published_at.map(|dt| dt.to_rfc3339()),
            created_at: page.created_at.to_rfc3339(),
            updated_at: page.updated_at.to_rfc3339(),
            meta_title: page.meta_title,
            meta_description: page.meta_description,
            custom_fields: page.custom_fields,
        }
    }
}

/// Nested page listing
pub type PageTree = TreeNode<PageResponse>;

impl From<TreeNode<Page>> for PageTree {
    fn from(node: TreeNode<Page>) -> Self {
        node.map(PageResponse::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_create_defaults_from_json() {
        let input: PageCreate =
            serde_json::from_str(r#"{"title":"About","slug":"about","author_id":1}"#).unwrap();
        assert_eq!(input.template, "default");
        assert_eq!(input.status, ContentStatus::Draft);
        assert_eq!(input.sort_order, 0);
        assert!(input.custom_fields.is_empty());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_create_validation() {
        let mut input = PageCreate::new("About", "about", 1);
        input.template = String::new();
        assert_eq!(input.validate().unwrap_err().field, "template");

        let mut input = PageCreate::new("About", "about", 1);
        input.tag_ids = vec![0];
        assert_eq!(input.validate().unwrap_err().field, "tag_ids");
    }

    #[test]
    fn test_published_page_is_stamped() {
        let mut input = PageCreate::new("About", "about", 1);
        input.status = ContentStatus::Published;
        assert!(Page::new(input).published_at.is_some());
    }

    #[test]
    fn test_update_custom_fields_and_parent() {
        let mut input = PageCreate::new("Team", "team", 1);
        input.parent_id = Some(4);
        input.category_id = Some(2);
        let mut page = Page::new(input);

        let update: PageUpdate = serde_json::from_value(json!({
            "parent_id": null,
            "custom_fields": {"hero": "team.jpg"}
        }))
        .unwrap();
        update.apply_to(&mut page, Utc::now());

        assert_eq!(page.parent_id, None);
        assert_eq!(page.category_id, Some(2));
        assert_eq!(page.custom_fields["hero"], "team.jpg");
    }

    #[test]
    fn test_response_carries_custom_fields() {
        let mut input = PageCreate::new("About", "about", 1);
        input.custom_fields.insert("layout".to_string(), json!("wide"));
        let json = serde_json::to_value(PageResponse::from(Page::new(input))).unwrap();
        assert_eq!(json["custom_fields"]["layout"], "wide");
        assert_eq!(json["template"], "default");
    }
}
