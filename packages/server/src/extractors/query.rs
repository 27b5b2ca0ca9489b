use axum::extract::{FromRequestParts, RawQuery};
use axum::http::request::Parts;
use common::{QueryDefaults, QueryState};

use crate::error::AppError;

/// Table state rebuilt from the request's query string.
///
/// Never rejects: unknown keys and malformed values fall back to defaults,
/// the same way a pasted URL is read in the browser.
pub struct TableQuery(pub QueryState);

impl<S> FromRequestParts<S> for TableQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RawQuery(query) = RawQuery::from_request_parts(parts, state)
            .await
            .unwrap_or(RawQuery(None));
        let state = QueryState::from_query_string(
            query.as_deref().unwrap_or_default(),
            &QueryDefaults::default(),
        );
        Ok(TableQuery(state))
    }
}
