//! Per-user file operations.
//!
//! Upload, search, download and delete against a namespaced object store.
//! Keys come from [`crate::keys`]; backend failures are translated into
//! [`FileError`].

mod error;
mod service;
mod types;

pub use error::FileError;
pub use service::FileService;
pub use types::{DownloadedFile, UploadRequest};
