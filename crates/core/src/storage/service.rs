//! Object store implementation using Apache OpenDAL.

use std::io;
use std::pin::pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt, future, stream};
use opendal::{ErrorKind, Operator, Writer, services};
use tracing::warn;

use super::error::StorageError;
use super::store::{KeyStream, ObjectStore, StoredObject};
use docvault_shared::config::{StorageConfig, StorageProvider};

/// OpenDAL-backed storage service.
///
/// Built once at startup from explicit configuration and shared through
/// `Arc`. The operator carries its own connection handling; nothing here is
/// mutable after construction.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let mut builder = services::S3::default()
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
        }
    }

    /// Validate a declared upload size against config constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if the size exceeds the configured maximum.
    pub fn validate_upload(&self, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        Ok(())
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the bucket/container name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        self.config.provider.bucket()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Copy `content` into `writer`, enforcing the size limits.
    async fn drain<S>(
        &self,
        key: &str,
        writer: &mut Writer,
        content: S,
        declared: Option<u64>,
    ) -> Result<u64, StorageError>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        let max = self.config.max_file_size;
        let mut content = pin!(content);
        let mut written: u64 = 0;

        while let Some(chunk) = content.next().await {
            let chunk = chunk.map_err(|e| StorageError::content(e.to_string()))?;
            written += chunk.len() as u64;
            if written > max {
                return Err(StorageError::file_too_large(written, max));
            }
            writer
                .write(chunk)
                .await
                .map_err(|e| StorageError::at(key, &e))?;
        }

        match declared {
            Some(expected) if expected != written => {
                Err(StorageError::size_mismatch(expected, written))
            }
            _ => Ok(written),
        }
    }
}

impl ObjectStore for StorageService {
    async fn put<S>(
        &self,
        key: &str,
        content: S,
        content_type: Option<&str>,
        size: Option<u64>,
    ) -> Result<u64, StorageError>
    where
        S: Stream<Item = io::Result<Bytes>> + Send,
    {
        if let Some(declared) = size {
            self.validate_upload(declared)?;
        }

        let mut request = self.operator.writer_with(key);
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        let mut writer = request.await.map_err(|e| StorageError::at(key, &e))?;

        match self.drain(key, &mut writer, content, size).await {
            Ok(written) => {
                writer.close().await.map_err(|e| StorageError::at(key, &e))?;
                Ok(written)
            }
            Err(err) => {
                if let Err(abort_err) = writer.abort().await {
                    warn!(key, error = %abort_err, "Failed to abort partial upload");
                }
                Err(err)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<StoredObject, StorageError> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::at(key, &e))?;
        if meta.mode().is_dir() {
            return Err(StorageError::not_found(key));
        }

        let content = self
            .operator
            .reader(key)
            .await
            .map_err(|e| StorageError::at(key, &e))?
            .into_bytes_stream(..)
            .await
            .map_err(|e| StorageError::at(key, &e))?;

        Ok(StoredObject {
            key: key.to_string(),
            content_type: meta.content_type().map(String::from),
            size: meta.content_length(),
            content: content.boxed(),
        })
    }

    async fn list_by_prefix(&self, prefix: &str) -> Result<KeyStream, StorageError> {
        let lister = match self.operator.lister_with(prefix).recursive(true).await {
            Ok(lister) => lister,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(stream::empty().boxed()),
            Err(e) => return Err(StorageError::at(prefix, &e)),
        };

        let prefix = prefix.to_string();
        Ok(lister
            .try_filter_map(|entry| {
                future::ready(Ok(entry
                    .metadata()
                    .mode()
                    .is_file()
                    .then(|| entry.path().to_string())))
            })
            .map_err(move |e| StorageError::at(&prefix, &e))
            .boxed())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.operator
            .delete(key)
            .await
            .map_err(|e| StorageError::at(key, &e))
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn memory_service(max_file_size: u64) -> StorageService {
        let config = StorageConfig::new(StorageProvider::Memory).with_max_file_size(max_file_size);
        StorageService::from_config(config).expect("should create service")
    }

    fn chunks(parts: &[&'static [u8]]) -> impl Stream<Item = io::Result<Bytes>> + Send + use<> {
        let parts: Vec<io::Result<Bytes>> =
            parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        stream::iter(parts)
    }

    async fn read_all(object: StoredObject) -> Vec<u8> {
        object
            .content
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .expect("readable content")
    }

    #[test]
    fn test_provider_metadata() {
        let service = memory_service(1024);
        assert_eq!(service.provider_name(), "memory");
        assert_eq!(service.bucket(), "memory");
        assert_eq!(service.config().max_file_size, 1024);
    }

    #[test]
    fn test_local_fs_service_builds() {
        let root = std::env::temp_dir().join("docvault-storage-test");
        let config = StorageConfig::new(StorageProvider::local_fs(root));
        let service = StorageService::from_config(config).expect("should create service");
        assert_eq!(service.provider_name(), "local");
    }

    #[test]
    fn test_validate_upload_size() {
        let service = memory_service(1024);

        assert!(service.validate_upload(512).is_ok());
        assert!(service.validate_upload(1024).is_ok());

        let err = service.validate_upload(2048).unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { size: 2048, max: 1024 }));
    }

    #[tokio::test]
    async fn test_put_then_get_streams_content() {
        let service = memory_service(1024);

        let written = service
            .put("alice/notes.txt", chunks(&[b"hello ", b"world"]), Some("text/plain"), Some(11))
            .await
            .expect("put should succeed");
        assert_eq!(written, 11);

        let object = service.get("alice/notes.txt").await.expect("object exists");
        assert_eq!(object.key, "alice/notes.txt");
        assert_eq!(object.size, 11);
        assert_eq!(read_all(object).await, b"hello world");
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let service = memory_service(1024);
        let err = service.get("alice/missing.pdf").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { key } if key == "alice/missing.pdf"));
    }

    #[tokio::test]
    async fn test_put_rejects_declared_size_over_limit() {
        let service = memory_service(4);
        let err = service
            .put("alice/big.bin", chunks(&[b"12345"]), None, Some(5))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { size: 5, max: 4 }));
        assert!(service.get("alice/big.bin").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_put_aborts_stream_over_limit() {
        let service = memory_service(4);
        let err = service
            .put("alice/big.bin", chunks(&[b"123", b"45"]), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { size: 5, max: 4 }));
        assert!(service.get("alice/big.bin").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_put_rejects_size_mismatch() {
        let service = memory_service(1024);
        let err = service
            .put("alice/short.bin", chunks(&[b"abc"]), None, Some(10))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::SizeMismatch {
                expected: 10,
                actual: 3
            }
        ));
    }

    #[tokio::test]
    async fn test_put_surfaces_content_errors() {
        let service = memory_service(1024);
        let failing = stream::iter(vec![
            Ok(Bytes::from_static(b"partial")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "client went away")),
        ]);
        let err = service
            .put("alice/broken.bin", failing, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Content(msg) if msg.contains("client went away")));
    }

    #[tokio::test]
    async fn test_list_by_prefix_yields_only_files_under_prefix() {
        let service = memory_service(1024);
        for key in ["alice/a.txt", "alice/b.txt", "alicia/c.txt", "bob/a.txt"] {
            service
                .put(key, chunks(&[b"x"]), None, None)
                .await
                .expect("put should succeed");
        }

        let mut keys: Vec<String> = service
            .list_by_prefix("alice/")
            .await
            .expect("list should succeed")
            .try_collect()
            .await
            .expect("stream should succeed");
        keys.sort();

        assert_eq!(keys, vec!["alice/a.txt", "alice/b.txt"]);
    }

    #[tokio::test]
    async fn test_list_by_prefix_empty_namespace() {
        let service = memory_service(1024);
        let keys: Vec<String> = service
            .list_by_prefix("nobody/")
            .await
            .expect("list should succeed")
            .try_collect()
            .await
            .expect("stream should succeed");
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let service = memory_service(1024);
        service
            .put("alice/a.txt", chunks(&[b"x"]), None, None)
            .await
            .expect("put should succeed");

        service.delete("alice/a.txt").await.expect("first delete");
        service.delete("alice/a.txt").await.expect("second delete");
        assert!(service.get("alice/a.txt").await.unwrap_err().is_not_found());
    }
}
