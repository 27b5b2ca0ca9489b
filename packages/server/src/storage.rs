use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::s3::{S3BlobStore, S3Settings};
use common::storage::{BlobStore, DownloadSigner, StorageError};
use tracing::info;

use crate::config::{AppConfig, StorageBackend};

/// Path the download route is mounted under, relative to the public base URL.
pub const DOWNLOAD_ROUTE: &str = "/api/v1/files";

pub fn download_signer(config: &AppConfig) -> DownloadSigner {
    let base = format!(
        "{}{DOWNLOAD_ROUTE}",
        config.storage.public_base_url.trim_end_matches('/')
    );
    DownloadSigner::new(config.auth.jwt_secret.as_bytes(), base)
}

/// Build the configured blob store.
pub async fn build_blob_store(
    config: &AppConfig,
    signer: DownloadSigner,
) -> Result<Arc<dyn BlobStore>, StorageError> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Filesystem => {
            info!(path = %storage.base_path.display(), "Using filesystem blob store");
            let store = FilesystemBlobStore::new(
                storage.base_path.clone(),
                storage.max_upload_size,
                signer,
            )
            .await?;
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => {
            let s3 = storage.s3.as_ref().ok_or_else(|| {
                StorageError::Backend("storage.backend = \"s3\" requires a [storage.s3] section".into())
            })?;
            info!(bucket = %s3.bucket, "Using S3 blob store");
            let settings = S3Settings {
                bucket: s3.bucket.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                access_key: s3.access_key.clone(),
                secret_key: s3.secret_key.clone(),
            };
            Ok(Arc::new(S3BlobStore::new(&settings, storage.max_upload_size)?))
        }
    }
}
