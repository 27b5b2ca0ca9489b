use std::sync::Arc;

use common::storage::{BlobStore, DownloadSigner};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::repository::DbRecordRepository;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub blob_store: Arc<dyn BlobStore>,
    /// Verifies tokens of `/files/{token}` download links.
    pub download_signer: DownloadSigner,
}

impl AppState {
    pub fn records(&self) -> DbRecordRepository<'_> {
        DbRecordRepository::new(&self.db)
    }
}
