//! Database layer
//!
//! SQLite storage for the content store:
//! - `pool`: connection setup shared by every repository
//! - `migrations`: embedded schema, applied at startup
//! - `repositories`: one trait + SQLx implementation per entity

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
