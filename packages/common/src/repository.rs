//! Record retrieval: the repository seam plus the listing and export
//! pipelines built on top of it.
//!
//! Listing has two paths. With no filter active one page fetch returns the
//! page and the count. With any filter active the work is split:
//! first every matching identifier is collected (which also yields the true
//! total), then only the requested page of those identifiers is hydrated with
//! its relations. Export reuses the identifier search without pagination and
//! hydrates only the relations its columns need.

use async_trait::async_trait;
use thiserror::Error;

use crate::csv;
use crate::export::{ExportError, ExportPlan};
use crate::query::{PageRange, QueryState, RecordFilters, Sort};
use crate::record::{FilingRecord, RelationSet};

/// Failure reported by a store implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RepositoryError(pub String);

impl RepositoryError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// Which listing phase failed.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The unfiltered listing (count plus page) failed.
    #[error("failed to list records")]
    Listing(#[source] RepositoryError),

    /// Collecting matching identifiers failed. Never reported as an empty
    /// result.
    #[error("failed to search records")]
    FilterQuery(#[source] RepositoryError),

    /// Loading rows for an already known identifier set failed.
    #[error("failed to load matching records")]
    Hydration(#[source] RepositoryError),
}

impl QueryError {
    pub fn store_error(&self) -> &RepositoryError {
        match self {
            Self::Listing(e) | Self::FilterQuery(e) | Self::Hydration(e) => e,
        }
    }
}

/// One page of records and the total number of matches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordPage {
    pub records: Vec<FilingRecord>,
    pub total_count: u64,
}

/// A certificate reference attached to a record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CertificateRef {
    pub record_id: i32,
    pub path: Option<String>,
}

#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Identifiers of every record matching `filters`. With no filter active
    /// this is every record.
    async fn search_ids(&self, filters: &RecordFilters) -> Result<Vec<i32>, RepositoryError>;

    /// Unfiltered listing: one joined query plus a server-side count.
    async fn fetch_page(&self, sort: Sort, range: PageRange) -> Result<RecordPage, RepositoryError>;

    /// Load the records in `ids` with the relations in `relations`, ordered by
    /// `sort` with ties broken by identifier descending. `range`, when given,
    /// windows the ordered result.
    async fn hydrate(
        &self,
        ids: &[i32],
        sort: Sort,
        range: Option<PageRange>,
        relations: RelationSet,
    ) -> Result<Vec<FilingRecord>, RepositoryError>;

    /// Certificate references for the records in `ids` that exist.
    async fn certificate_paths(&self, ids: &[i32]) -> Result<Vec<CertificateRef>, RepositoryError>;

    /// Delete rows in one batch. Returns the identifiers that existed and
    /// were removed.
    async fn delete_rows(&self, ids: &[i32]) -> Result<Vec<i32>, RepositoryError>;
}

/// Resolve a listing request.
pub async fn list_records<R>(repo: &R, state: &QueryState) -> Result<RecordPage, QueryError>
where
    R: RecordRepository + ?Sized,
{
    if !state.filters.is_active() {
        return repo
            .fetch_page(state.sort(), state.range())
            .await
            .map_err(QueryError::Listing);
    }

    let ids = repo
        .search_ids(&state.filters)
        .await
        .map_err(QueryError::FilterQuery)?;

    if ids.is_empty() {
        return Ok(RecordPage::default());
    }

    let total_count = ids.len() as u64;
    let records = repo
        .hydrate(&ids, state.sort(), Some(state.range()), RelationSet::ALL)
        .await
        .map_err(QueryError::Hydration)?;

    Ok(RecordPage {
        records,
        total_count,
    })
}

/// Produce the CSV text for every record matching `filters`.
pub async fn export_records<R>(
    repo: &R,
    filters: &RecordFilters,
    sort: Sort,
    plan: &ExportPlan,
) -> Result<String, ExportError>
where
    R: RecordRepository + ?Sized,
{
    let ids = repo
        .search_ids(filters)
        .await
        .map_err(QueryError::FilterQuery)?;

    if ids.is_empty() {
        return Err(ExportError::NoMatchingRecords);
    }

    let records = repo
        .hydrate(&ids, sort, None, plan.relations())
        .await
        .map_err(QueryError::Hydration)?;

    tracing::debug!(rows = records.len(), columns = ?plan.keys(), "Encoding export");
    Ok(csv::encode(
        &plan.labels(),
        records.iter().map(|r| plan.flatten(r)),
    ))
}
