//! Object storage adapter using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem (development only)
//! - In-process memory (tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ObjectStore trait                           │
//! │        put / get / list_by_prefix / delete (by full key)         │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.writer_with("key")      │ op.reader("key")                   │
//! │ op.lister_with("prefix/")  │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod service;
mod store;

pub use docvault_shared::config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
pub use store::{ByteStream, KeyStream, ObjectStore, StoredObject};
