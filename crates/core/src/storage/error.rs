//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Bytes declared or received so far.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Received byte count differs from the declared size.
    #[error("file size mismatch: declared {expected} bytes, received {actual}")]
    SizeMismatch {
        /// Declared size.
        expected: u64,
        /// Bytes actually received.
        actual: u64,
    },

    /// File not found in storage.
    #[error("file not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),

    /// Reading the caller's content stream failed.
    #[error("failed to read upload content: {0}")]
    Content(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a size mismatch error.
    #[must_use]
    pub fn size_mismatch(expected: u64, actual: u64) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }

    /// Create a content stream error.
    #[must_use]
    pub fn content(msg: impl Into<String>) -> Self {
        Self::Content(msg.into())
    }

    /// Translate an OpenDAL error raised while operating on `key`.
    #[must_use]
    pub fn at(key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::Operation(err.to_string()),
        }
    }

    /// Returns true if the backend reported the object as absent.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Keyless conversion. Use [`StorageError::at`] when the key is known.
impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        Self::Operation(err.to_string())
    }
}
