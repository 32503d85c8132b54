//! Shared configuration and error types for Docvault.
//!
//! This crate provides common types used across all other crates:
//! - Application-wide error taxonomy with HTTP status mapping
//! - Configuration management (server, storage backend, file policies)

pub mod config;
pub mod error;

pub use config::{AppConfig, EmptySearchPolicy, FilesConfig, StorageConfig, StorageProvider};
pub use error::AppError;
