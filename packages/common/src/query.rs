//! Table query state and its canonical query-string form.
//!
//! A [`QueryState`] is a plain value: every mutation returns a new state.
//! Changing what matches (any filter, the sort, the page size) resets the page
//! to 1 because previous offsets no longer point at the same rows.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page number. Keeps the row offset within a signed 64-bit SQL
/// `OFFSET` for every allowed page size.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PAGE_SIZE + 1;

/// Column a record listing can be ordered by.
///
/// Anything outside this enumeration parses to [`SortField::CreatedAt`], so a
/// caller-supplied string never reaches the query builder.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    Year,
}

impl SortField {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Title => "title",
            Self::Year => "year",
        }
    }

    pub fn from_param(value: &str) -> Self {
        match value.trim() {
            "title" => Self::Title,
            "year" => Self::Year,
            _ => Self::CreatedAt,
        }
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_param(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn from_param(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Ordering applied to a record listing or export.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Zero-based row window of one page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRange {
    pub offset: u64,
    pub limit: u64,
}

impl PageRange {
    /// Inclusive `(first, last)` row indexes covered by this range.
    pub fn bounds(&self) -> (u64, u64) {
        let last = self.offset.saturating_add(self.limit.saturating_sub(1));
        (self.offset, last.min(i64::MAX as u64))
    }
}

/// The filter portion of a [`QueryState`], shared by listing and export.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordFilters {
    /// Trimmed free-text search; empty means no search.
    pub search: String,
    pub type_id: Option<i32>,
    pub status_id: Option<i32>,
    pub year: Option<i32>,
    pub agency_id: Option<i32>,
}

impl RecordFilters {
    /// Returns the search term, or `None` when there is no search.
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }

    /// True when any search text or categorical filter is set.
    pub fn is_active(&self) -> bool {
        self.search_term().is_some()
            || self.type_id.is_some()
            || self.status_id.is_some()
            || self.year.is_some()
            || self.agency_id.is_some()
    }
}

/// Defaults that the canonical query string omits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryDefaults {
    pub page_size: u64,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// What subset of records, in what order, which page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryState {
    pub filters: RecordFilters,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    /// 1-based.
    pub page: u64,
    pub page_size: u64,
}

impl Default for QueryState {
    fn default() -> Self {
        Self::new(&QueryDefaults::default())
    }
}

impl QueryState {
    pub fn new(defaults: &QueryDefaults) -> Self {
        Self {
            filters: RecordFilters::default(),
            sort_field: SortField::default(),
            sort_direction: SortDirection::default(),
            page: 1,
            page_size: clamp_page_size(defaults.page_size, DEFAULT_PAGE_SIZE),
        }
    }

    pub fn sort(&self) -> Sort {
        Sort {
            field: self.sort_field,
            direction: self.sort_direction,
        }
    }

    pub fn range(&self) -> PageRange {
        PageRange {
            offset: (self.page.clamp(1, MAX_PAGE) - 1)
                .saturating_mul(self.page_size)
                .min(i64::MAX as u64),
            limit: self.page_size,
        }
    }

    /// True when the state can be written to and read back from a query
    /// string unchanged.
    pub fn is_canonical(&self) -> bool {
        let f = &self.filters;
        (1..=MAX_PAGE).contains(&self.page)
            && (1..=MAX_PAGE_SIZE).contains(&self.page_size)
            && f.search == f.search.trim()
            && [f.type_id, f.status_id, f.agency_id, f.year]
                .iter()
                .all(|v| v.is_none_or(|n| n > 0))
    }

    pub fn with_search(self, search: &str) -> Self {
        let search = search.trim().to_string();
        self.with_filters(|f| f.search = search)
    }

    pub fn with_type_filter(self, type_id: Option<i32>) -> Self {
        self.with_filters(|f| f.type_id = type_id)
    }

    pub fn with_status_filter(self, status_id: Option<i32>) -> Self {
        self.with_filters(|f| f.status_id = status_id)
    }

    pub fn with_year_filter(self, year: Option<i32>) -> Self {
        self.with_filters(|f| f.year = year)
    }

    pub fn with_agency_filter(self, agency_id: Option<i32>) -> Self {
        self.with_filters(|f| f.agency_id = agency_id)
    }

    pub fn clear_filters(self) -> Self {
        self.with_filters(|f| *f = RecordFilters::default())
    }

    pub fn with_sort_field(mut self, field: SortField) -> Self {
        if self.sort_field != field {
            self.sort_field = field;
            self.page = 1;
        }
        self
    }

    pub fn with_sort_direction(mut self, direction: SortDirection) -> Self {
        if self.sort_direction != direction {
            self.sort_direction = direction;
            self.page = 1;
        }
        self
    }

    /// Clicking a column header: same column flips direction, a new column
    /// starts descending.
    pub fn toggle_sort(self, field: SortField) -> Self {
        if self.sort_field == field {
            let direction = self.sort_direction.reversed();
            self.with_sort_direction(direction)
        } else {
            self.with_sort_field(field)
                .with_sort_direction(SortDirection::Desc)
        }
    }

    pub fn with_page(mut self, page: u64) -> Self {
        self.page = page.clamp(1, MAX_PAGE);
        self
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        let page_size = clamp_page_size(page_size, self.page_size);
        if self.page_size != page_size {
            self.page_size = page_size;
            self.page = 1;
        }
        self
    }

    fn with_filters(mut self, mutate: impl FnOnce(&mut RecordFilters)) -> Self {
        let before = self.filters.clone();
        mutate(&mut self.filters);
        if self.filters != before {
            self.page = 1;
        }
        self
    }

    /// Canonical query string: only fields that differ from their default,
    /// in a fixed key order, without a leading `?`.
    pub fn to_query_string(&self, defaults: &QueryDefaults) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        let f = &self.filters;

        if let Some(term) = f.search_term() {
            pairs.push(("search", term.to_string()));
        }
        if let Some(id) = f.type_id {
            pairs.push(("typeId", id.to_string()));
        }
        if let Some(id) = f.status_id {
            pairs.push(("statusId", id.to_string()));
        }
        if let Some(year) = f.year {
            pairs.push(("year", year.to_string()));
        }
        if let Some(id) = f.agency_id {
            pairs.push(("agencyId", id.to_string()));
        }
        if self.sort_field != SortField::default() {
            pairs.push(("sortBy", self.sort_field.as_param().to_string()));
        }
        if self.sort_direction != SortDirection::default() {
            pairs.push(("sortOrder", self.sort_direction.as_param().to_string()));
        }
        if self.page > 1 {
            pairs.push(("page", self.page.to_string()));
        }
        if self.page_size != defaults.page_size {
            pairs.push(("pageSize", self.page_size.to_string()));
        }

        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }

    /// Parse a query string leniently: unknown keys are ignored, malformed
    /// values fall back to their defaults, the last duplicate wins.
    pub fn from_query_string(query: &str, defaults: &QueryDefaults) -> Self {
        let mut state = Self::new(defaults);
        let query = query.strip_prefix('?').unwrap_or(query);

        let pairs: Vec<(String, String)> = match serde_urlencoded::from_str(query) {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::debug!("Unparsable query string, using defaults: {e}");
                return state;
            }
        };

        for (key, value) in pairs {
            match key.as_str() {
                "search" => state.filters.search = value.trim().to_string(),
                "typeId" => state.filters.type_id = parse_id(&value),
                "statusId" => state.filters.status_id = parse_id(&value),
                "year" => state.filters.year = parse_id(&value),
                "agencyId" => state.filters.agency_id = parse_id(&value),
                "sortBy" => state.sort_field = SortField::from_param(&value),
                "sortOrder" => state.sort_direction = SortDirection::from_param(&value),
                "page" => {
                    state.page = value
                        .trim()
                        .parse::<i64>()
                        .map(|p| (p.max(1) as u64).min(MAX_PAGE))
                        .unwrap_or(1);
                }
                "pageSize" => {
                    state.page_size = value
                        .trim()
                        .parse::<u64>()
                        .map(|size| clamp_page_size(size, defaults.page_size))
                        .unwrap_or(defaults.page_size);
                }
                _ => {}
            }
        }

        state
    }
}

fn parse_id(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

fn clamp_page_size(size: u64, fallback: u64) -> u64 {
    match size {
        0 => fallback.clamp(1, MAX_PAGE_SIZE),
        n => n.min(MAX_PAGE_SIZE),
    }
}
