//! Common API utilities and shared types

use axum::{http::StatusCode, Json};
use serde::Deserialize;

use crate::models::ListParams;

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Default page size
pub fn default_per_page() -> u32 {
    20
}

/// `?page=&per_page=`; out-of-range values are clamped
#[derive(Debug, Deserialize)]
pub struct PaginationQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

impl PaginationQuery {
    pub fn params(&self) -> ListParams {
        ListParams::new(self.page, self.per_page)
    }
}

/// `201 Created` with the new record as body
pub type Created<T> = (StatusCode, Json<T>);

pub fn created<T>(body: T) -> Created<T> {
    (StatusCode::CREATED, Json(body))
}
