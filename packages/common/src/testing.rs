//! In-memory fakes for exercising the pipelines without a database.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::query::{PageRange, RecordFilters, Sort, SortDirection, SortField};
use crate::record::{Applicant, FilingRecord, NamedRef, RelationSet};
use crate::repository::{CertificateRef, RecordPage, RecordRepository, RepositoryError};
use crate::storage::{BlobStore, BoxReader, StorageError};

/// A record whose `created_at` grows with its id.
pub fn sample_record(id: i32, title: &str, applicant: &str, status_id: i32) -> FilingRecord {
    let created_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        + chrono::Duration::minutes(i64::from(id));
    FilingRecord {
        id,
        title: title.to_string(),
        product_category: None,
        facilitation_year: Some(2023),
        certificate_path: None,
        notes: None,
        created_at,
        updated_at: created_at,
        applicant: Some(Applicant {
            id,
            name: applicant.to_string(),
            address: None,
        }),
        ip_type: Some(NamedRef {
            id: 1,
            name: "Merek".into(),
        }),
        status: Some(NamedRef {
            id: status_id,
            name: format!("Status {status_id}"),
        }),
        agency: Some(NamedRef {
            id: 1,
            name: "Dinas Koperasi".into(),
        }),
        ip_class: None,
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Calls {
    pub search_ids: usize,
    pub fetch_page: usize,
    pub hydrate: usize,
    pub certificate_paths: usize,
    pub delete_rows: usize,
}

#[derive(Default)]
struct RepoState {
    records: BTreeMap<i32, FilingRecord>,
    calls: Calls,
    fail_search: bool,
    fail_hydrate: bool,
    fail_delete: bool,
    last_relations: Option<RelationSet>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    state: Mutex<RepoState>,
}

impl InMemoryRepository {
    pub fn insert(&self, record: FilingRecord) {
        self.state.lock().unwrap().records.insert(record.id, record);
    }

    pub fn ids(&self) -> Vec<i32> {
        self.state.lock().unwrap().records.keys().copied().collect()
    }

    pub fn calls(&self) -> Calls {
        self.state.lock().unwrap().calls
    }

    pub fn last_relations(&self) -> Option<RelationSet> {
        self.state.lock().unwrap().last_relations
    }

    pub fn fail_search(&self) {
        self.state.lock().unwrap().fail_search = true;
    }

    pub fn fail_hydrate(&self) {
        self.state.lock().unwrap().fail_hydrate = true;
    }

    pub fn fail_delete(&self) {
        self.state.lock().unwrap().fail_delete = true;
    }
}

fn matches(record: &FilingRecord, filters: &RecordFilters) -> bool {
    let eq = |filter: Option<i32>, value: Option<i32>| filter.is_none() || filter == value;
    let search_hit = filters.search_term().is_none_or(|term| {
        let term = term.to_lowercase();
        record.title.to_lowercase().contains(&term)
            || record
                .applicant
                .as_ref()
                .is_some_and(|a| a.name.to_lowercase().contains(&term))
    });

    search_hit
        && eq(filters.type_id, record.ip_type.as_ref().map(|r| r.id))
        && eq(filters.status_id, record.status.as_ref().map(|r| r.id))
        && eq(filters.agency_id, record.agency.as_ref().map(|r| r.id))
        && eq(filters.year, record.facilitation_year)
}

fn sorted(mut records: Vec<FilingRecord>, sort: Sort) -> Vec<FilingRecord> {
    records.sort_by(|a, b| {
        let primary = match sort.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Year => a.facilitation_year.cmp(&b.facilitation_year),
        };
        let primary = match sort.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then(b.id.cmp(&a.id))
    });
    records
}

fn window(records: Vec<FilingRecord>, range: Option<PageRange>) -> Vec<FilingRecord> {
    match range {
        Some(r) => records
            .into_iter()
            .skip(r.offset as usize)
            .take(r.limit as usize)
            .collect(),
        None => records,
    }
}

fn strip(mut record: FilingRecord, relations: RelationSet) -> FilingRecord {
    if !relations.applicant {
        record.applicant = None;
    }
    if !relations.ip_type {
        record.ip_type = None;
    }
    if !relations.status {
        record.status = None;
    }
    if !relations.agency {
        record.agency = None;
    }
    if !relations.ip_class {
        record.ip_class = None;
    }
    record
}

#[async_trait]
impl RecordRepository for InMemoryRepository {
    async fn search_ids(&self, filters: &RecordFilters) -> Result<Vec<i32>, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.search_ids += 1;
        if state.fail_search {
            return Err(RepositoryError::new("connection reset"));
        }
        Ok(state
            .records
            .values()
            .filter(|r| matches(r, filters))
            .map(|r| r.id)
            .collect())
    }

    async fn fetch_page(&self, sort: Sort, range: PageRange) -> Result<RecordPage, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.fetch_page += 1;
        let all: Vec<_> = state.records.values().cloned().collect();
        let total_count = all.len() as u64;
        Ok(RecordPage {
            records: window(sorted(all, sort), Some(range)),
            total_count,
        })
    }

    async fn hydrate(
        &self,
        ids: &[i32],
        sort: Sort,
        range: Option<PageRange>,
        relations: RelationSet,
    ) -> Result<Vec<FilingRecord>, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.hydrate += 1;
        state.last_relations = Some(relations);
        if state.fail_hydrate {
            return Err(RepositoryError::new("statement timeout"));
        }
        let selected: Vec<_> = ids
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .map(|r| strip(r, relations))
            .collect();
        Ok(window(sorted(selected, sort), range))
    }

    async fn certificate_paths(&self, ids: &[i32]) -> Result<Vec<CertificateRef>, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.certificate_paths += 1;
        Ok(ids
            .iter()
            .filter_map(|id| state.records.get(id))
            .map(|r| CertificateRef {
                record_id: r.id,
                path: r.certificate_path.clone(),
            })
            .collect())
    }

    async fn delete_rows(&self, ids: &[i32]) -> Result<Vec<i32>, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_rows += 1;
        if state.fail_delete {
            return Err(RepositoryError::new("foreign key violation"));
        }
        Ok(ids
            .iter()
            .filter(|id| state.records.remove(id).is_some())
            .copied()
            .collect())
    }
}

#[derive(Default)]
struct BlobState {
    blobs: BTreeMap<String, Vec<u8>>,
    remove_calls: Vec<Vec<String>>,
    fail_remove: bool,
}

#[derive(Default)]
pub struct InMemoryBlobStore {
    state: Mutex<BlobState>,
}

impl InMemoryBlobStore {
    pub fn seed(&self, key: &str) {
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(key.to_string(), b"blob".to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().unwrap().blobs.keys().cloned().collect()
    }

    pub fn remove_calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().remove_calls.clone()
    }

    pub fn fail_remove(&self) {
        self.state.lock().unwrap().fail_remove = true;
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, data: &[u8], _content_type: &str) -> Result<(), StorageError> {
        self.state
            .lock()
            .unwrap()
            .blobs
            .insert(key.to_string(), data.to_vec());
        Ok(())
    }

    async fn get_stream(&self, key: &str) -> Result<BoxReader, StorageError> {
        let state = self.state.lock().unwrap();
        let data = state
            .blobs
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.state.lock().unwrap().blobs.contains_key(key))
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut state = self.state.lock().unwrap();
        state.remove_calls.push(keys.to_vec());
        if state.fail_remove {
            return Err(StorageError::Backend("bucket unavailable".into()));
        }
        for key in keys {
            state.blobs.remove(key);
        }
        Ok(())
    }

    async fn signed_url(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!("memory://{key}?ttl={}", ttl.as_secs()))
    }
}
