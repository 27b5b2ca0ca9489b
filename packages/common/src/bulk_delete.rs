use std::collections::HashSet;

use thiserror::Error;

use crate::repository::{RecordRepository, RepositoryError};
use crate::storage::BlobStore;

/// Largest id set accepted by one bulk delete.
pub const MAX_BULK_DELETE: usize = 500;

#[derive(Debug, Error)]
pub enum BulkDeleteError {
    #[error("{0}")]
    Invalid(String),

    #[error("failed to look up certificates")]
    Lookup(#[source] RepositoryError),

    /// Row deletion failed; no blob was touched.
    #[error("failed to delete records")]
    Delete(#[source] RepositoryError),
}

/// Result of a successful delete. Blob cleanup problems are reported in
/// `warnings` without failing the operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub deleted_ids: Vec<i32>,
    pub warnings: Vec<String>,
}

/// Reject malformed id sets before any store is called.
pub fn validate_ids(ids: &[i32]) -> Result<(), BulkDeleteError> {
    if ids.is_empty() {
        return Err(BulkDeleteError::Invalid("ids must not be empty".into()));
    }
    if ids.len() > MAX_BULK_DELETE {
        return Err(BulkDeleteError::Invalid(format!(
            "at most {MAX_BULK_DELETE} ids can be deleted at once"
        )));
    }
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(BulkDeleteError::Invalid(format!(
            "ids must be positive integers (got {bad})"
        )));
    }
    let mut seen = HashSet::with_capacity(ids.len());
    if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
        return Err(BulkDeleteError::Invalid(format!("duplicate id {dup}")));
    }
    Ok(())
}

/// Delete records, then their certificate blobs.
///
/// Rows go first in one batch; if that fails nothing else happens. Blobs of
/// the rows that were actually removed are then deleted in one batch, and a
/// failure there only produces a warning.
pub async fn delete_records<R, B>(
    repo: &R,
    blobs: &B,
    ids: &[i32],
) -> Result<DeleteOutcome, BulkDeleteError>
where
    R: RecordRepository + ?Sized,
    B: BlobStore + ?Sized,
{
    validate_ids(ids)?;

    let certificates = repo
        .certificate_paths(ids)
        .await
        .map_err(BulkDeleteError::Lookup)?;

    let deleted_ids = repo
        .delete_rows(ids)
        .await
        .map_err(BulkDeleteError::Delete)?;

    let orphaned: Vec<String> = certificates
        .into_iter()
        .filter(|c| deleted_ids.contains(&c.record_id))
        .filter_map(|c| c.path)
        .collect();

    let mut warnings = Vec::new();
    if !orphaned.is_empty()
        && let Err(e) = blobs.remove(&orphaned).await
    {
        tracing::warn!(
            error = %e,
            paths = ?orphaned,
            "Records deleted but certificate cleanup failed"
        );
        warnings.push(format!(
            "{} certificate file(s) could not be removed: {e}",
            orphaned.len()
        ));
    }

    Ok(DeleteOutcome {
        deleted_ids,
        warnings,
    })
}
