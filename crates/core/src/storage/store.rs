//! Backend-neutral object store interface.

use std::fmt;
use std::future::Future;
use std::io;

use bytes::Bytes;
use futures::Stream;
use futures::stream::BoxStream;

use super::error::StorageError;

/// Object content streamed out of the store.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Keys produced by a prefix listing. Lazy, finite and not restartable.
pub type KeyStream = BoxStream<'static, Result<String, StorageError>>;

/// An object read from the store, content still unread.
pub struct StoredObject {
    /// Storage key.
    pub key: String,
    /// Content type recorded at upload, if the backend keeps it.
    pub content_type: Option<String>,
    /// Content length in bytes.
    pub size: u64,
    /// Object content.
    pub content: ByteStream,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("key", &self.key)
            .field("content_type", &self.content_type)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Minimal object store used by the file gateway.
///
/// Implementations perform no retries or caching. Every call maps to one
/// backend request (or one streamed sequence of requests).
pub trait ObjectStore: Send + Sync {
    /// Store `content` under `key`, replacing any existing object.
    ///
    /// Returns the number of bytes written. The content stream is consumed
    /// and dropped before the returned future completes, on success or error.
    fn put<S>(
        &self,
        key: &str,
        content: S,
        content_type: Option<&str>,
        size: Option<u64>,
    ) -> impl Future<Output = Result<u64, StorageError>> + Send
    where
        S: Stream<Item = io::Result<Bytes>> + Send;

    /// Open the object stored under `key`.
    ///
    /// Fails with [`StorageError::NotFound`] when no object exists.
    fn get(&self, key: &str) -> impl Future<Output = Result<StoredObject, StorageError>> + Send;

    /// Enumerate every stored key that starts with `prefix`.
    fn list_by_prefix(
        &self,
        prefix: &str,
    ) -> impl Future<Output = Result<KeyStream, StorageError>> + Send;

    /// Remove the object under `key`. Removing an absent key succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
