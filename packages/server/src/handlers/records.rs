use std::time::Duration;

use axum::Json;
use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::FilingRecord;
use common::bulk_delete::delete_records;
use common::export::{ExportError, ExportPlan};
use common::record::{IpClass, NamedRef};
use common::repository;
use common::storage::{certificate_extension, certificate_key};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{
    applicant, filing_record, filing_status, ip_class, ip_type, proposing_agency,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::TableQuery;
use crate::models::records::*;
use crate::models::shared::total_pages;
use crate::state::AppState;
use crate::utils::filename::{Disposition, content_disposition_value, export_filename};

#[utoipa::path(
    get,
    path = "/",
    tag = "Records",
    operation_id = "listRecords",
    summary = "List filing records",
    description = "Returns one page of records with every relation. Search matches the title or the \
        applicant name, case-insensitively. Malformed parameters fall back to their defaults; \
        unknown `sortBy` values sort by `createdAt`. Ties are broken by id descending.",
    params(RecordListParams),
    responses(
        (status = 200, description = "Page of records", body = RecordListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    TableQuery(query): TableQuery,
) -> Result<Json<RecordListResponse>, AppError> {
    let page = repository::list_records(&state.records(), &query).await?;

    Ok(Json(RecordListResponse {
        total_pages: total_pages(page.total_count, query.page_size),
        records: page.records,
        total_count: page.total_count,
        page: query.page,
        page_size: query.page_size,
    }))
}

#[utoipa::path(
    get,
    path = "/options",
    tag = "Records",
    operation_id = "getRecordOptions",
    summary = "Filter dropdown options",
    description = "IP types, filing statuses, distinct facilitation years (newest first), \
        proposing agencies and IP classes.",
    responses(
        (status = 200, description = "Filter options", body = RecordOptionsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn record_options(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<RecordOptionsResponse>, AppError> {
    let db = &state.db;
    let (ip_types, statuses, years, agencies, ip_classes) = tokio::try_join!(
        ip_type::Entity::find()
            .order_by_asc(ip_type::Column::Name)
            .all(db),
        filing_status::Entity::find()
            .order_by_asc(filing_status::Column::Id)
            .all(db),
        filing_record::Entity::find()
            .select_only()
            .column(filing_record::Column::FacilitationYear)
            .distinct()
            .filter(filing_record::Column::FacilitationYear.is_not_null())
            .order_by_desc(filing_record::Column::FacilitationYear)
            .into_tuple::<i32>()
            .all(db),
        proposing_agency::Entity::find()
            .order_by_asc(proposing_agency::Column::Name)
            .all(db),
        ip_class::Entity::find()
            .order_by_asc(ip_class::Column::Id)
            .all(db),
    )?;

    Ok(Json(RecordOptionsResponse {
        ip_types: ip_types
            .into_iter()
            .map(|m| NamedRef { id: m.id, name: m.name })
            .collect(),
        statuses: statuses
            .into_iter()
            .map(|m| NamedRef { id: m.id, name: m.name })
            .collect(),
        years,
        agencies: agencies
            .into_iter()
            .map(|m| NamedRef { id: m.id, name: m.name })
            .collect(),
        ip_classes: ip_classes
            .into_iter()
            .map(|m| IpClass { id: m.id, name: m.name, kind: m.kind })
            .collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Records",
    operation_id = "createRecord",
    summary = "Create a filing record",
    description = "Multipart form. The applicant is matched by name: an existing applicant is \
        reused and its address overwritten. The optional `file` is stored before the row is \
        inserted and removed again if the insert fails.",
    request_body(content = RecordForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Record created", body = FilingRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, record_id))]
pub async fn create_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let (input, upload) = read_record_form(multipart, state.config.storage.max_upload_size).await?;
    let upload = checked_upload(upload)?;
    ensure_references(&state.db, &input).await?;

    let certificate_path = match upload {
        Some((upload, extension)) => Some(store_certificate(&state, &upload, extension).await?),
        None => None,
    };

    let id = match insert_record(&state.db, &input, certificate_path.clone()).await {
        Ok(id) => id,
        Err(e) => {
            if let Some(key) = &certificate_path {
                discard_blob(&state, key).await;
            }
            return Err(e.into());
        }
    };

    tracing::Span::current().record("record_id", id);
    tracing::info!("Record created");

    let record = state
        .records()
        .find_one(id)
        .await?
        .ok_or_else(|| AppError::Internal("Record missing after insert".into()))?;

    Ok((StatusCode::CREATED, Json(record)))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Records",
    operation_id = "getRecord",
    summary = "Get a filing record",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Record", body = FilingRecord),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Record not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FilingRecord>, AppError> {
    state
        .records()
        .find_one(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Record not found".into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Records",
    operation_id = "updateRecord",
    summary = "Update a filing record",
    description = "Full-field update: every form field is re-sent. A new `file` is uploaded \
        first, then the row is switched to it, then the old certificate is removed. Without a \
        `file` the current certificate is kept unless `removeCertificate=true`.",
    params(("id" = i32, Path, description = "Record ID")),
    request_body(content = RecordForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Record updated", body = FilingRecord),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Record not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn update_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<FilingRecord>, AppError> {
    let existing = find_record_row(&state.db, id).await?;

    let (input, upload) = read_record_form(multipart, state.config.storage.max_upload_size).await?;
    let upload = checked_upload(upload)?;
    ensure_references(&state.db, &input).await?;

    let new_key = match upload {
        Some((upload, extension)) => Some(store_certificate(&state, &upload, extension).await?),
        None => None,
    };

    let certificate_path = match &new_key {
        Some(key) => Some(key.clone()),
        None if input.remove_certificate => None,
        None => existing.certificate_path.clone(),
    };

    if let Err(e) = update_row(&state.db, id, &input, certificate_path.clone()).await {
        if let Some(key) = &new_key {
            discard_blob(&state, key).await;
        }
        return Err(e.into());
    }

    if let Some(old) = &existing.certificate_path
        && certificate_path.as_deref() != Some(old.as_str())
    {
        discard_blob(&state, old).await;
    }

    tracing::info!("Record updated");

    state
        .records()
        .find_one(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Record not found".into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Records",
    operation_id = "deleteRecord",
    summary = "Delete a filing record",
    description = "Deletes the row, then its certificate. A certificate that cannot be removed \
        is reported in `warnings`; the record stays deleted.",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Record deleted", body = DeleteRecordResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Record not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_record(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteRecordResponse>, AppError> {
    let outcome = delete_records(&state.records(), &*state.blob_store, &[id]).await?;

    let Some(&deleted_id) = outcome.deleted_ids.first() else {
        return Err(AppError::NotFound("Record not found".into()));
    };

    tracing::info!("Record deleted");

    Ok(Json(DeleteRecordResponse {
        deleted_id,
        warnings: outcome.warnings,
    }))
}

#[utoipa::path(
    post,
    path = "/bulk-delete",
    tag = "Records",
    operation_id = "bulkDeleteRecords",
    summary = "Delete several records",
    description = "Accepts 1-500 distinct positive ids. Rows are deleted in one batch; if that \
        fails no certificate is touched. Certificates of the deleted rows are then removed in \
        one batch, and failures there only add `warnings`. Unknown ids are skipped.",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Records deleted", body = BulkDeleteResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, count = payload.ids.len()))]
pub async fn bulk_delete_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let outcome = delete_records(&state.records(), &*state.blob_store, &payload.ids).await?;

    tracing::info!(deleted = outcome.deleted_ids.len(), "Records bulk deleted");

    Ok(Json(BulkDeleteResponse {
        deleted_ids: outcome.deleted_ids,
        warnings: outcome.warnings,
    }))
}

#[utoipa::path(
    get,
    path = "/{id}/certificate-url",
    tag = "Records",
    operation_id = "getCertificateUrl",
    summary = "Time-limited certificate link",
    description = "Returns a URL that grants read access to the record's certificate for \
        `storage.signed_url_ttl_secs` seconds.",
    params(("id" = i32, Path, description = "Record ID")),
    responses(
        (status = 200, description = "Signed URL", body = CertificateUrlResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Record or certificate not found (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Blob store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn certificate_url(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<CertificateUrlResponse>, AppError> {
    let row = find_record_row(&state.db, id).await?;
    let path = row
        .certificate_path
        .ok_or_else(|| AppError::NotFound("Record has no certificate".into()))?;

    let ttl = state.config.storage.signed_url_ttl_secs;
    let signed_url = state
        .blob_store
        .signed_url(&path, Duration::from_secs(ttl))
        .await?;

    Ok(Json(CertificateUrlResponse {
        signed_url,
        expires_in_seconds: ttl,
    }))
}

#[utoipa::path(
    get,
    path = "/export",
    tag = "Records",
    operation_id = "exportRecords",
    summary = "Export matching records as CSV",
    description = "Exports every record matching the listing filters, ignoring pagination, in \
        the listing's sort order. `columns` picks and orders the CSV columns; unknown keys are \
        dropped. Available keys: id, title, product_category, applicant_name, applicant_address, \
        ip_type_name, ip_class_id, ip_class_name, ip_class_kind, agency_name, status_name, \
        facilitation_year, notes, certificate_path, created_at, updated_at.",
    params(RecordListParams, ExportParams),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 400, description = "No known column or unsupported format (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No records match (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (UPSTREAM_FAILURE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query, params), fields(user_id = auth_user.user_id))]
pub async fn export_records(
    auth_user: AuthUser,
    State(state): State<AppState>,
    TableQuery(query): TableQuery,
    Query(params): Query<ExportParams>,
) -> Result<Response, AppError> {
    let format = params
        .format
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or("csv");
    if !format.eq_ignore_ascii_case("csv") {
        return Err(ExportError::UnsupportedFormat(format.to_string()).into());
    }

    let plan = ExportPlan::from_param(params.columns.as_deref().unwrap_or_default())?;
    let csv =
        repository::export_records(&state.records(), &query.filters, query.sort(), &plan).await?;

    let filename = export_filename(Utc::now().date_naive());
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(Disposition::Attachment, &filename),
        )
        .body(Body::from(csv))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

async fn find_record_row<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<filing_record::Model, AppError> {
    filing_record::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Record not found".into()))
}

/// Collect the multipart body into a validated form and the optional
/// certificate. An empty `file` part counts as no file.
async fn read_record_form(
    mut multipart: Multipart,
    max_size: u64,
) -> Result<(RecordInput, Option<CertificateUpload>), AppError> {
    let mut fields = RecordFormFields::default();
    let mut upload = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name != "file" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{name}': {e}")))?;
            fields.set(&name, text);
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let mut data = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            if (data.len() + chunk.len()) as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {max_size} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        upload = (!data.is_empty()).then_some(CertificateUpload {
            filename,
            content_type,
            data,
        });
    }

    Ok((fields.validate()?, upload))
}

fn checked_upload(
    upload: Option<CertificateUpload>,
) -> Result<Option<(CertificateUpload, &'static str)>, AppError> {
    let Some(upload) = upload else {
        return Ok(None);
    };
    let extension =
        certificate_extension(upload.filename.as_deref(), upload.content_type.as_deref())
            .ok_or_else(|| {
                AppError::Validation(
                    "Certificate must be a PDF or an image (pdf, png, jpg, jpeg, webp)".into(),
                )
            })?;
    Ok(Some((upload, extension)))
}

async fn store_certificate(
    state: &AppState,
    upload: &CertificateUpload,
    extension: &str,
) -> Result<String, AppError> {
    let key = certificate_key(extension);
    let content_type = mime_guess::from_ext(extension).first_or_octet_stream();
    state
        .blob_store
        .put(&key, &upload.data, content_type.essence_str())
        .await?;
    tracing::debug!(key = %key, size = upload.data.len(), "Certificate stored");
    Ok(key)
}

/// Remove a blob that is no longer referenced. Failures are only logged.
async fn discard_blob(state: &AppState, key: &str) {
    if let Err(e) = state.blob_store.remove(&[key.to_string()]).await {
        tracing::warn!(key = %key, error = %e, "Failed to remove unreferenced certificate");
    }
}

async fn reference_exists<E, C>(db: &C, id: i32) -> Result<bool, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
    i32: Into<<E::PrimaryKey as PrimaryKeyTrait>::ValueType>,
{
    Ok(E::find_by_id(id).one(db).await?.is_some())
}

/// Reject ids that do not point at an existing reference row, so a typo is a
/// validation error rather than a foreign-key failure.
async fn ensure_references<C: ConnectionTrait>(db: &C, input: &RecordInput) -> Result<(), AppError> {
    let missing = |field: &str, id: i32| {
        AppError::Validation(format!("{field} {id} does not reference an existing row"))
    };

    if !reference_exists::<ip_type::Entity, _>(db, input.ip_type_id).await? {
        return Err(missing("ipTypeId", input.ip_type_id));
    }
    if !reference_exists::<filing_status::Entity, _>(db, input.status_id).await? {
        return Err(missing("statusId", input.status_id));
    }
    if !reference_exists::<proposing_agency::Entity, _>(db, input.agency_id).await? {
        return Err(missing("agencyId", input.agency_id));
    }
    if let Some(class_id) = input.ip_class_id
        && !reference_exists::<ip_class::Entity, _>(db, class_id).await?
    {
        return Err(missing("ipClassId", class_id));
    }
    Ok(())
}

/// Insert or reuse the applicant with this name; the address is always
/// overwritten with the latest value.
async fn upsert_applicant<C: ConnectionTrait>(db: &C, input: &RecordInput) -> Result<i32, DbErr> {
    let model = applicant::ActiveModel {
        name: Set(input.applicant_name.clone()),
        address: Set(input.applicant_address.clone()),
        ..Default::default()
    };

    let saved = applicant::Entity::insert(model)
        .on_conflict(
            OnConflict::column(applicant::Column::Name)
                .update_column(applicant::Column::Address)
                .to_owned(),
        )
        .exec_with_returning(db)
        .await?;

    Ok(saved.id)
}

async fn insert_record(
    db: &DatabaseConnection,
    input: &RecordInput,
    certificate_path: Option<String>,
) -> Result<i32, DbErr> {
    let txn = db.begin().await?;

    let applicant_id = upsert_applicant(&txn, input).await?;
    let now = Utc::now();
    let model = filing_record::ActiveModel {
        title: Set(input.title.clone()),
        product_category: Set(input.product_category.clone()),
        facilitation_year: Set(input.facilitation_year),
        certificate_path: Set(certificate_path),
        notes: Set(input.notes.clone()),
        applicant_id: Set(applicant_id),
        ip_type_id: Set(input.ip_type_id),
        status_id: Set(input.status_id),
        agency_id: Set(input.agency_id),
        ip_class_id: Set(input.ip_class_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    Ok(model.id)
}

async fn update_row(
    db: &DatabaseConnection,
    id: i32,
    input: &RecordInput,
    certificate_path: Option<String>,
) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    let applicant_id = upsert_applicant(&txn, input).await?;
    filing_record::ActiveModel {
        id: Unchanged(id),
        title: Set(input.title.clone()),
        product_category: Set(input.product_category.clone()),
        facilitation_year: Set(input.facilitation_year),
        certificate_path: Set(certificate_path),
        notes: Set(input.notes.clone()),
        applicant_id: Set(applicant_id),
        ip_type_id: Set(input.ip_type_id),
        status_id: Set(input.status_id),
        agency_id: Set(input.agency_id),
        ip_class_id: Set(input.ip_class_id),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    Ok(())
}
