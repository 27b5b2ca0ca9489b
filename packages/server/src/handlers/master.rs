use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::record::{IpClass, NamedRef};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{filing_status, ip_class, ip_type, proposing_agency};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::master::{
    MasterCreate, MasterCreateBody, MasterRow, MasterTable, MasterUpdate, MasterUpdateBody,
};
use crate::state::AppState;

fn named(id: i32, name: String) -> MasterRow {
    MasterRow::Named(NamedRef { id, name })
}

fn class(m: ip_class::Model) -> MasterRow {
    MasterRow::Class(IpClass {
        id: m.id,
        name: m.name,
        kind: m.kind,
    })
}

fn not_found(table: MasterTable) -> AppError {
    AppError::NotFound(format!("No such row in {table}"))
}

#[utoipa::path(
    get,
    path = "/{table}",
    tag = "Master Data",
    operation_id = "listMasterRows",
    summary = "List reference rows",
    description = "`table` is one of `ip-types`, `agencies` (ordered by name) or `ip-classes` \
        (ordered by class number). Any other value is rejected.",
    params(("table" = String, Path, description = "ip-types | ip-classes | agencies")),
    responses(
        (status = 200, description = "Rows", body = Vec<MasterRow>),
        (status = 400, description = "Unknown table (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_master_rows(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Json<Vec<MasterRow>>, AppError> {
    let table: MasterTable = table.parse()?;
    let db = &state.db;

    let rows = match table {
        MasterTable::IpTypes => ip_type::Entity::find()
            .order_by_asc(ip_type::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| named(m.id, m.name))
            .collect(),
        MasterTable::Agencies => proposing_agency::Entity::find()
            .order_by_asc(proposing_agency::Column::Name)
            .all(db)
            .await?
            .into_iter()
            .map(|m| named(m.id, m.name))
            .collect(),
        MasterTable::IpClasses => ip_class::Entity::find()
            .order_by_asc(ip_class::Column::Id)
            .all(db)
            .await?
            .into_iter()
            .map(class)
            .collect(),
    };

    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/{table}",
    tag = "Master Data",
    operation_id = "createMasterRow",
    summary = "Create a reference row",
    description = "Body is `{name}` for `ip-types` and `agencies`, `{id, name, kind}` for \
        `ip-classes`. Admin only.",
    params(("table" = String, Path, description = "ip-types | ip-classes | agencies")),
    request_body = MasterCreateBody,
    responses(
        (status = 201, description = "Row created", body = MasterRow),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Duplicate name or class number (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(user_id = auth_user.user_id))]
pub async fn create_master_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(table): Path<String>,
    AppJson(body): AppJson<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;
    let table: MasterTable = table.parse()?;
    let db = &state.db;

    let row = match MasterCreate::parse(table, body)? {
        MasterCreate::IpType { name } => {
            let m = ip_type::ActiveModel {
                name: Set(name),
                ..Default::default()
            }
            .insert(db)
            .await?;
            named(m.id, m.name)
        }
        MasterCreate::Agency { name } => {
            let m = proposing_agency::ActiveModel {
                name: Set(name),
                ..Default::default()
            }
            .insert(db)
            .await?;
            named(m.id, m.name)
        }
        MasterCreate::IpClass { id, name, kind } => {
            let m = ip_class::ActiveModel {
                id: Set(id),
                name: Set(name),
                kind: Set(kind),
                ..Default::default()
            }
            .insert(db)
            .await?;
            class(m)
        }
    };

    tracing::info!(table = %table, "Master row created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    patch,
    path = "/{table}/{id}",
    tag = "Master Data",
    operation_id = "updateMasterRow",
    summary = "Update a reference row",
    description = "Body is `{name}` for `ip-types` and `agencies`, `{name, kind}` for \
        `ip-classes`; the class number cannot change. Admin only.",
    params(
        ("table" = String, Path, description = "ip-types | ip-classes | agencies"),
        ("id" = i32, Path, description = "Row ID"),
    ),
    request_body = MasterUpdateBody,
    responses(
        (status = 200, description = "Row updated", body = MasterRow),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Row not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Duplicate name (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, body), fields(user_id = auth_user.user_id))]
pub async fn update_master_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i32)>,
    AppJson(body): AppJson<serde_json::Value>,
) -> Result<Json<MasterRow>, AppError> {
    auth_user.require_admin()?;
    let table: MasterTable = table.parse()?;
    let db = &state.db;

    let updated = match MasterUpdate::parse(table, body)? {
        MasterUpdate::IpType { name } => ip_type::ActiveModel {
            id: Unchanged(id),
            name: Set(name),
            ..Default::default()
        }
        .update(db)
        .await
        .map(|m| named(m.id, m.name)),
        MasterUpdate::Agency { name } => proposing_agency::ActiveModel {
            id: Unchanged(id),
            name: Set(name),
            ..Default::default()
        }
        .update(db)
        .await
        .map(|m| named(m.id, m.name)),
        MasterUpdate::IpClass { name, kind } => {
            ip_class::ActiveModel {
                id: Unchanged(id),
                name: Set(name),
                kind: Set(kind),
                ..Default::default()
            }
            .update(db)
            .await
            .map(class)
        }
    };

    match updated {
        Ok(row) => {
            tracing::info!(table = %table, "Master row updated");
            Ok(Json(row))
        }
        Err(DbErr::RecordNotUpdated) => Err(not_found(table)),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    delete,
    path = "/{table}/{id}",
    tag = "Master Data",
    operation_id = "deleteMasterRow",
    summary = "Delete a reference row",
    description = "Fails with `DEPENDENCY_CONFLICT` while records still reference the row. \
        Admin only.",
    params(
        ("table" = String, Path, description = "ip-types | ip-classes | agencies"),
        ("id" = i32, Path, description = "Row ID"),
    ),
    responses(
        (status = 204, description = "Row deleted"),
        (status = 400, description = "Unknown table (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Row not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Row still in use (DEPENDENCY_CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_master_row(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((table, id)): Path<(String, i32)>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;
    let table: MasterTable = table.parse()?;
    let db = &state.db;

    let result = match table {
        MasterTable::IpTypes => ip_type::Entity::delete_by_id(id).exec(db).await?,
        MasterTable::Agencies => proposing_agency::Entity::delete_by_id(id).exec(db).await?,
        MasterTable::IpClasses => ip_class::Entity::delete_by_id(id).exec(db).await?,
    };

    if result.rows_affected == 0 {
        return Err(not_found(table));
    }

    tracing::info!(table = %table, "Master row deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/statuses",
    tag = "Master Data",
    operation_id = "listFilingStatuses",
    summary = "List filing statuses",
    description = "Filing statuses are a fixed set seeded on startup and cannot be edited.",
    responses(
        (status = 200, description = "Statuses", body = Vec<NamedRef>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_statuses(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NamedRef>>, AppError> {
    let statuses = filing_status::Entity::find()
        .order_by_asc(filing_status::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|m| NamedRef { id: m.id, name: m.name })
        .collect();

    Ok(Json(statuses))
}
