use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::key::validate_key;
use super::traits::{BlobStore, BoxReader};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, Supabase storage, ...). Uses path-style
    /// addressing when set.
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

/// Blob store backed by an S3-compatible bucket. Read URLs are presigned
/// GET requests issued by the object store itself.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    max_size: u64,
}

fn backend(e: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(e.to_string())
}

impl S3BlobStore {
    pub fn new(settings: &S3Settings, max_size: u64) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&settings.access_key),
            Some(&settings.secret_key),
            None,
            None,
            None,
        )
        .map_err(backend)?;

        let bucket = match &settings.endpoint {
            Some(endpoint) => {
                let region = Region::Custom {
                    region: settings.region.clone(),
                    endpoint: endpoint.clone(),
                };
                Bucket::new(&settings.bucket, region, credentials)
                    .map_err(backend)?
                    .with_path_style()
            }
            None => {
                let region: Region = settings.region.parse().map_err(backend)?;
                Bucket::new(&settings.bucket, region, credentials).map_err(backend)?
            }
        };

        Ok(Self { bucket, max_size })
    }
}

fn check_status(key: &str, status: u16) -> Result<(), StorageError> {
    match status {
        200..=299 => Ok(()),
        404 => Err(StorageError::NotFound(key.to_string())),
        other => Err(StorageError::Backend(format!(
            "object store returned HTTP {other} for {key}"
        ))),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<(), StorageError> {
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }
        let key = validate_key(key)?;
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(backend)?;
        check_status(key, response.status_code())
    }

    async fn get_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let key = validate_key(key)?;
        let response = self.bucket.get_object(key).await.map_err(backend)?;
        check_status(key, response.status_code())?;
        Ok(Box::new(Cursor::new(response.bytes().to_vec())))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let key = validate_key(key)?;
        let (_, status) = self.bucket.head_object(key).await.map_err(backend)?;
        match check_status(key, status) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in keys {
            let result = match validate_key(key) {
                Ok(key) => match self.bucket.delete_object(key).await {
                    Ok(response) => match check_status(key, response.status_code()) {
                        Err(StorageError::NotFound(_)) => Ok(()),
                        other => other,
                    },
                    Err(e) => Err(backend(e)),
                },
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::debug!(key = %key, error = %e, "Failed to remove object");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let key = validate_key(key)?;
        let secs = u32::try_from(ttl.as_secs()).unwrap_or(u32::MAX);
        self.bucket
            .presign_get(key, secs, None)
            .await
            .map_err(backend)
    }
}
