//! Many-to-many edge records
//!
//! Each edge is a bare composite key. Edges are written together with their
//! owning post or page and removed by cascade when either endpoint goes.

use serde::{Deserialize, Serialize};

/// A junction row: the owning record on the left, the linked record on the right
pub trait Edge: Copy + Send + Sync {
    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str;
    const TARGET_COLUMN: &'static str;

    fn owner_id(&self) -> i64;
    fn target_id(&self) -> i64;
}

/// Row in `post_categories`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostCategoryLink {
    pub post_id: i64,
    pub category_id: i64,
}

/// Row in `post_tags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostTagLink {
    pub post_id: i64,
    pub tag_id: i64,
}

/// Row in `page_tags`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageTagLink {
    pub page_id: i64,
    pub tag_id: i64,
}

impl Edge for PostCategoryLink {
    const TABLE: &'static str = "post_categories";
    const OWNER_COLUMN: &'static str = "post_id";
    const TARGET_COLUMN: &'static str = "category_id";

    fn owner_id(&self) -> i64 {
        self.post_id
    }

    fn target_id(&self) -> i64 {
        self.category_id
    }
}

impl Edge for PostTagLink {
    const TABLE: &'static str = "post_tags";
    const OWNER_COLUMN: &'static str = "post_id";
    const TARGET_COLUMN: &'static str = "tag_id";

    fn owner_id(&self) -> i64 {
        self.post_id
    }

    fn target_id(&self) -> i64 {
        self.tag_id
    }
}

impl Edge for PageTagLink {
    const TABLE: &'static str = "page_tags";
    const OWNER_COLUMN: &'static str = "page_id";
    const TARGET_COLUMN: &'static str = "tag_id";

    fn owner_id(&self) -> i64 {
        self.page_id
    }

    fn target_id(&self) -> i64 {
        self.tag_id
    }
}

impl PostCategoryLink {
    pub fn for_post(post_id: i64, category_ids: &[i64]) -> Vec<Self> {
        category_ids
            .iter()
            .map(|&category_id| Self { post_id, category_id })
            .collect()
    }
}

impl PostTagLink {
    pub fn for_post(post_id: i64, tag_ids: &[i64]) -> Vec<Self> {
        tag_ids.iter().map(|&tag_id| Self { post_id, tag_id }).collect()
    }
}

impl PageTagLink {
    pub fn for_page(page_id: i64, tag_ids: &[i64]) -> Vec<Self> {
        tag_ids.iter().map(|&tag_id| Self { page_id, tag_id }).collect()
    }
}
