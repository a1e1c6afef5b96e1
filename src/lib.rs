//! Folio - content store for a small CMS
//!
//! Users, hierarchical categories, tags, posts, pages, threaded comments and
//! a media library, persisted in SQLite and served as a JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
