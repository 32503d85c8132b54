//! File operation error types.

use thiserror::Error;

use crate::keys::KeyError;
use crate::storage::StorageError;
use docvault_shared::AppError;

/// File operation errors.
#[derive(Debug, Error)]
pub enum FileError {
    /// Missing or malformed user id, file name or key.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No object exists at the key.
    #[error("file not found: {key}")]
    FileNotFound {
        /// Requested storage key.
        key: String,
    },

    /// Upload exceeds the configured maximum size.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Declared or received size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Received content length differs from the declared size.
    #[error("file size mismatch: expected {expected}, got {actual}")]
    SizeMismatch {
        /// Declared size.
        expected: u64,
        /// Received size.
        actual: u64,
    },

    /// Backend failure while uploading.
    #[error("failed to upload {key}")]
    UploadFailed {
        /// Target storage key.
        key: String,
        /// Backend error.
        source: StorageError,
    },

    /// Backend failure while downloading.
    #[error("failed to download {key}")]
    DownloadFailed {
        /// Requested storage key.
        key: String,
        /// Backend error.
        source: StorageError,
    },

    /// Backend failure while deleting.
    #[error("failed to delete {key}")]
    DeleteFailed {
        /// Target storage key.
        key: String,
        /// Backend error.
        source: StorageError,
    },

    /// Backend failure while listing a user's namespace.
    #[error("failed to search files for user {user_id}")]
    SearchFailed {
        /// Searched user id.
        user_id: String,
        /// Backend error.
        source: StorageError,
    },
}

impl FileError {
    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a file not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::FileNotFound { key: key.into() }
    }

    /// Returns true when the request itself was at fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_)
                | Self::FileNotFound { .. }
                | Self::FileTooLarge { .. }
                | Self::SizeMismatch { .. }
        )
    }
}

impl From<KeyError> for FileError {
    fn from(err: KeyError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::InvalidInput(_) | FileError::SizeMismatch { .. } => {
                Self::Validation(err.to_string())
            }
            FileError::FileNotFound { .. } => Self::NotFound(err.to_string()),
            FileError::FileTooLarge { .. } => Self::PayloadTooLarge(err.to_string()),
            FileError::UploadFailed { .. }
            | FileError::DownloadFailed { .. }
            | FileError::DeleteFailed { .. }
            | FileError::SearchFailed { .. } => Self::ExternalService(err.to_string()),
        }
    }
}
