//! File operation types.

use std::fmt;
use std::io;

use futures::TryStreamExt;

use crate::keys::StorageKey;
use crate::storage::{ByteStream, StoredObject};

/// Upload input: who, what name, and the content stream.
#[derive(Debug)]
pub struct UploadRequest<S> {
    /// Owner of the namespace.
    pub user_id: String,
    /// File name inside the namespace.
    pub file_name: String,
    /// Content type (MIME type), if known.
    pub content_type: Option<String>,
    /// Declared size in bytes, if known.
    pub size: Option<u64>,
    /// File content.
    pub content: S,
}

impl<S> UploadRequest<S> {
    /// Create an upload request with unknown type and size.
    pub fn new(user_id: impl Into<String>, file_name: impl Into<String>, content: S) -> Self {
        Self {
            user_id: user_id.into(),
            file_name: file_name.into(),
            content_type: None,
            size: None,
            content,
        }
    }

    /// Set the content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the declared size.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

/// A file opened for download.
pub struct DownloadedFile {
    /// Storage key.
    pub key: StorageKey,
    /// Content type recorded at upload.
    pub content_type: Option<String>,
    /// Content length in bytes.
    pub size: u64,
    /// File content.
    pub content: ByteStream,
}

impl DownloadedFile {
    /// Read the whole content into memory.
    pub async fn read_to_end(self) -> io::Result<Vec<u8>> {
        let capacity = usize::try_from(self.size).unwrap_or(0);
        self.content
            .try_fold(Vec::with_capacity(capacity), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
    }
}

impl From<StoredObject> for DownloadedFile {
    fn from(object: StoredObject) -> Self {
        Self {
            key: StorageKey::from_raw(object.key),
            content_type: object.content_type,
            size: object.size,
            content: object.content,
        }
    }
}

impl fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadedFile")
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
