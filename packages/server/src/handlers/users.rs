use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use crate::entity::user_profile::{self, ROLE_USER};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::UserResponse;
use crate::models::users::*;
use crate::state::AppState;
use crate::utils::hash;

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user_profile::Model, AppError> {
    user_profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// The configured super admin can only be changed through configuration.
fn ensure_not_super_admin(state: &AppState, user: &user_profile::Model) -> Result<(), AppError> {
    if user.username == state.config.auth.super_admin_username {
        tracing::warn!(target_user = %user.username, "Refused to modify the super admin");
        return Err(AppError::PermissionDenied);
    }
    Ok(())
}

fn hash_or_internal(password: &str) -> Result<String, AppError> {
    hash::hash_password(password).map_err(|e| AppError::Internal(format!("Password hash error: {e}")))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List user accounts",
    description = "Admin only. Ordered by username.",
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require_admin()?;

    let users = user_profile::Entity::find()
        .order_by_asc(user_profile::Column::Username)
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user account",
    description = "Admin only. The profile and its login credential are created together.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Username taken (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, username = %payload.username))]
pub async fn create_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_admin()?;

    let username = validate_username(&payload.username)?;
    let display_name = validate_display_name(&payload.display_name)?;
    validate_password(&payload.password)?;
    let role = validate_role(payload.role.as_deref().unwrap_or(ROLE_USER))?;

    let password = hash_or_internal(&payload.password)?;

    let user = user_profile::ActiveModel {
        username: Set(username),
        display_name: Set(display_name),
        role: Set(role),
        password: Set(password),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("Username is already taken".into())
        }
        _ => AppError::from(e),
    })?;

    tracing::info!(new_user_id = user.id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user account",
    description = "Admin only. Absent fields are left unchanged. The super admin cannot be edited.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden or super admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.require_admin()?;

    let user = find_user(&state.db, id).await?;
    ensure_not_super_admin(&state, &user)?;

    let mut active: user_profile::ActiveModel = user.into();
    if let Some(name) = &payload.display_name {
        active.display_name = Set(validate_display_name(name)?);
    }
    if let Some(role) = &payload.role {
        active.role = Set(validate_role(role)?);
    }
    if let Some(password) = &payload.password {
        validate_password(password)?;
        active.password = Set(hash_or_internal(password)?);
    }

    let updated = active.update(&state.db).await?;
    tracing::info!(target_user_id = id, "User updated");

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user account",
    description = "Admin only. The super admin and the caller's own account cannot be deleted.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Own account (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden or super admin (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    auth_user.require_admin()?;

    let user = find_user(&state.db, id).await?;
    ensure_not_super_admin(&state, &user)?;
    if user.id == auth_user.user_id {
        return Err(AppError::Validation("You cannot delete your own account".into()));
    }

    user_profile::Entity::delete_by_id(id).exec(&state.db).await?;
    tracing::info!(target_user_id = id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}
