pub mod bulk_delete;
pub mod csv;
pub mod debounce;
pub mod export;
pub mod query;
pub mod record;
pub mod repository;
pub mod selection;
pub mod storage;
pub mod table;

#[cfg(test)]
mod testing;

pub use query::{QueryDefaults, QueryState, RecordFilters, Sort, SortDirection, SortField};
pub use record::{ClassKind, FilingRecord, RelationSet};
