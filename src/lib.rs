//! Keepsake - self-hosted personal memories API
//!
//! This crate provides:
//! - SQLite storage for memory records
//! - An HTTP API (list, get, create, update, delete) scoped to the
//!   authenticated owner
//! - JWT bearer-token verification in front of every memory route
//!
//! # Usage
//!
//! As a library:
//! ```ignore
//! use keepsake::{api, Config, Database};
//! use std::sync::Arc;
//!
//! let config = Config::from_file("~/.keepsake/config.toml")?;
//! let db = Arc::new(Database::new(config.db_path())?);
//! api::serve(config.server_addr()?, db, &config).await?;
//! ```
//!
//! As a standalone server (CLI):
//! ```text
//! keepsake --config ~/.keepsake/config.toml
//! ```

pub mod api;
pub mod config;
pub mod db;
pub mod error;

// Re-export main types for convenience
pub use config::Config;
pub use db::Database;
pub use error::{Result, ServiceError};
