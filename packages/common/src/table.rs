use crate::debounce::UrlCommitter;
use crate::query::{QueryDefaults, QueryState, SortDirection, SortField};
use crate::selection::SelectionTracker;

/// A user interaction with the records table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableAction {
    Search(String),
    TypeFilter(Option<i32>),
    StatusFilter(Option<i32>),
    YearFilter(Option<i32>),
    AgencyFilter(Option<i32>),
    ClearFilters,
    SortBy(SortField),
    SortDirection(SortDirection),
    ToggleSort(SortField),
    Page(u64),
    PageSize(u64),
}

/// Pure reducer from one query state to the next.
pub fn reduce(state: QueryState, action: &TableAction) -> QueryState {
    match action {
        TableAction::Search(text) => state.with_search(text),
        TableAction::TypeFilter(id) => state.with_type_filter(*id),
        TableAction::StatusFilter(id) => state.with_status_filter(*id),
        TableAction::YearFilter(year) => state.with_year_filter(*year),
        TableAction::AgencyFilter(id) => state.with_agency_filter(*id),
        TableAction::ClearFilters => state.clear_filters(),
        TableAction::SortBy(field) => state.with_sort_field(*field),
        TableAction::SortDirection(direction) => state.with_sort_direction(*direction),
        TableAction::ToggleSort(field) => state.toggle_sort(*field),
        TableAction::Page(page) => state.with_page(*page),
        TableAction::PageSize(size) => state.with_page_size(*size),
    }
}

/// Owns everything a records view keeps between interactions: the query
/// state, the row selection and the URL committer.
///
/// The selection is cleared whenever the query state changes, since the
/// visible rows are no longer the ones that were checked.
pub struct TableController {
    state: QueryState,
    defaults: QueryDefaults,
    selection: SelectionTracker,
    committer: UrlCommitter,
}

impl TableController {
    /// Start from the query string currently in the address bar.
    pub fn from_url(query: &str, defaults: QueryDefaults, committer: UrlCommitter) -> Self {
        Self {
            state: QueryState::from_query_string(query, &defaults),
            defaults,
            selection: SelectionTracker::new(),
            committer,
        }
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionTracker {
        &mut self.selection
    }

    pub fn query_string(&self) -> String {
        self.state.to_query_string(&self.defaults)
    }

    /// Apply an interaction. Returns `true` when the state changed and the
    /// caller should refetch.
    pub fn apply(&mut self, action: TableAction) -> bool {
        let next = reduce(self.state.clone(), &action);
        if next == self.state {
            return false;
        }

        self.state = next;
        self.selection.clear();

        let query = self.query_string();
        match action {
            TableAction::Search(_) => self.committer.commit_debounced(query),
            _ => self.committer.commit_now(query),
        }
        true
    }

    /// Re-sync after back/forward navigation changed the address bar.
    pub fn sync_from_url(&mut self, query: &str) {
        let next = QueryState::from_query_string(query, &self.defaults);
        if next != self.state {
            self.state = next;
            self.selection.clear();
        }
    }
}
