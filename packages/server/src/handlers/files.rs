use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;
use crate::utils::filename::{Disposition, content_disposition_value};

#[utoipa::path(
    get,
    path = "/{token}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a blob through a signed link",
    description = "Streams the blob a token from `certificate-url` grants access to. The token \
        is the only credential; it expires after `storage.signed_url_ttl_secs` seconds.",
    params(("token" = String, Path, description = "Signed download token")),
    responses(
        (status = 200, description = "Blob content"),
        (status = 401, description = "Invalid or expired token (TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blob not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, token))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let key = state.download_signer.verify(&token)?;
    let reader = state.blob_store.get_stream(&key).await?;

    let content_type = mime_guess::from_path(&key).first_or_octet_stream();
    let filename = key.rsplit('/').next().unwrap_or(key.as_str());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.essence_str())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(Disposition::Inline, filename),
        )
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
