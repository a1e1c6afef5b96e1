//! Category model
//!
//! Categories form a hierarchy through a nullable `parent_id` and are linked
//! to posts many-to-many through `post_categories`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patch::Patch;
use super::tree::{TreeItem, TreeNode};
use super::validation::{self, ValidationError};

pub const NAME_MAX: usize = 100;
pub const SLUG_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 500;

/// Category entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Parent category (`None` for a root)
    pub parent_id: Option<i64>,
    /// User who created the category
    pub created_by_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// The ID will be set to 0 and should be assigned by the database.
    pub fn new(input: CategoryCreate) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: input.name,
            slug: input.slug,
            description: input.description,
            parent_id: input.parent_id,
            created_by_id: input.created_by_id,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TreeItem for Category {
    fn node_id(&self) -> i64 {
        self.id
    }

    fn parent_node_id(&self) -> Option<i64> {
        self.parent_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub created_by_id: i64,
}

impl CategoryCreate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::required("name", &self.name, NAME_MAX)?;
        validation::slug("slug", &self.slug, SLUG_MAX)?;
        validation::max_len("description", &self.description, DESCRIPTION_MAX)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `null` moves the category to the root
    #[serde(default, skip_serializing_if = "Patch::is_unset")]
    pub parent_id: Patch<i64>,
}

impl CategoryUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(ref name) = self.name {
            validation::required("name", name, NAME_MAX)?;
        }
        if let Some(ref slug) = self.slug {
            validation::slug("slug", slug, SLUG_MAX)?;
        }
        validation::optional_max_len("description", self.description.as_deref(), DESCRIPTION_MAX)?;
        Ok(())
    }

    pub fn apply_to(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(slug) = self.slug {
            category.slug = slug;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        self.parent_id.apply_to(&mut category.parent_id);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub parent_id: Option<i64>,
    pub created_by_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            parent_id: category.parent_id,
            created_by_id: category.created_by_id,
            created_at: category.created_at.to_rfc3339(),
            updated_at: category.updated_at.to_rfc3339(),
        }
    }
}

/// Nested category listing
pub type CategoryTree = TreeNode<CategoryResponse>;

impl From<TreeNode<Category>> for CategoryTree {
    fn from(node: TreeNode<Category>) -> Self {
        node.map(CategoryResponse::from)
    }
}
