//! File service implementation.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, TryStreamExt, future};
use tracing::{debug, error, info};

use super::error::FileError;
use super::types::{DownloadedFile, UploadRequest};
use crate::keys::{self, StorageKey};
use crate::storage::{ObjectStore, StorageError};

/// Namespaced file gateway over an object store.
///
/// Stateless apart from the injected store; every call is independent and
/// may run concurrently with any other.
pub struct FileService<S: ObjectStore> {
    store: Arc<S>,
}

impl<S: ObjectStore> FileService<S> {
    /// Create a new file service.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Get the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Upload a file into the user's namespace.
    ///
    /// Overwrites any existing object with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - User id or file name is invalid
    /// - The file exceeds the size limit or does not match its declared size
    /// - The backend write fails
    pub async fn upload_file<C>(&self, request: UploadRequest<C>) -> Result<StorageKey, FileError>
    where
        C: Stream<Item = io::Result<Bytes>> + Send,
    {
        let UploadRequest {
            user_id,
            file_name,
            content_type,
            size,
            content,
        } = request;

        let key = keys::resolve_key(&user_id, &file_name)?;

        match self
            .store
            .put(key.as_str(), content, content_type.as_deref(), size)
            .await
        {
            Ok(written) => {
                info!(user_id = %user_id, key = %key, bytes = written, "File uploaded");
                Ok(key)
            }
            Err(StorageError::FileTooLarge { size, max }) => {
                Err(FileError::FileTooLarge { size, max })
            }
            Err(StorageError::SizeMismatch { expected, actual }) => {
                Err(FileError::SizeMismatch { expected, actual })
            }
            Err(e) => {
                error!(user_id = %user_id, key = %key, error = %e, "Upload to storage failed");
                Err(FileError::UploadFailed {
                    key: key.into_string(),
                    source: e,
                })
            }
        }
    }

    /// Search a user's namespace for keys containing `search_term`.
    ///
    /// Matching is a case-sensitive substring test against the full key,
    /// prefix included. Results keep the order the backend listed them in.
    /// No matches is an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the user id is invalid or the listing fails.
    pub async fn search_files(
        &self,
        user_id: &str,
        search_term: &str,
    ) -> Result<Vec<StorageKey>, FileError> {
        let prefix = keys::resolve_prefix(user_id)?;
        let failed = |e: StorageError| {
            error!(user_id, search_term, error = %e, "Listing storage failed");
            FileError::SearchFailed {
                user_id: user_id.to_string(),
                source: e,
            }
        };

        self.store
            .list_by_prefix(&prefix)
            .await
            .map_err(failed)?
            .try_filter(|key| {
                future::ready(key.starts_with(prefix.as_str()) && key.contains(search_term))
            })
            .map_ok(StorageKey::from_raw)
            .try_collect()
            .await
            .map_err(failed)
    }

    /// Open a file by its fully composed key.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key is empty or would be rewritten by the backend
    /// - No object exists at the key
    /// - The backend read fails
    pub async fn download_file(&self, key: &str) -> Result<DownloadedFile, FileError> {
        keys::validate_raw_key(key)?;

        match self.store.get(key).await {
            Ok(object) => Ok(object.into()),
            Err(StorageError::NotFound { .. }) => {
                debug!(key, "Object not found");
                Err(FileError::not_found(key))
            }
            Err(e) => {
                error!(key, error = %e, "Download from storage failed");
                Err(FileError::DownloadFailed {
                    key: key.to_string(),
                    source: e,
                })
            }
        }
    }

    /// Delete a file from the user's namespace.
    ///
    /// Deleting a file that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is invalid or the backend delete fails.
    pub async fn delete_file(&self, user_id: &str, file_name: &str) -> Result<(), FileError> {
        let key = keys::resolve_key(user_id, file_name)?;

        self.store.delete(key.as_str()).await.map_err(|e| {
            error!(user_id, key = %key, error = %e, "Delete from storage failed");
            FileError::DeleteFailed {
                key: key.to_string(),
                source: e,
            }
        })?;

        info!(user_id, key = %key, "File deleted");
        Ok(())
    }
}
