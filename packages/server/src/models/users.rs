use serde::Deserialize;

use crate::entity::user_profile::{ROLE_ADMIN, ROLE_USER};
use crate::error::AppError;
use crate::models::shared::required_name;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;
const MAX_USERNAME_CHARS: usize = 32;

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// 1-32 chars, letters, digits and underscores.
    #[schema(example = "operator_dinas")]
    pub username: String,
    #[schema(example = "Operator Dinas")]
    pub display_name: String,
    /// 8-128 characters.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// `admin` or `user`. Default: `user`.
    #[schema(example = "user")]
    pub role: Option<String>,
}

/// Partial update. Absent fields are left unchanged.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

pub fn validate_username(username: &str) -> Result<String, AppError> {
    let username = username.trim();
    if username.is_empty() || username.chars().count() > MAX_USERNAME_CHARS {
        return Err(AppError::Validation(format!(
            "Username must be 1-{MAX_USERNAME_CHARS} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN || password.len() > MAX_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be {MIN_PASSWORD_LEN}-{MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_role(role: &str) -> Result<String, AppError> {
    match role.trim() {
        r @ (ROLE_ADMIN | ROLE_USER) => Ok(r.to_string()),
        _ => Err(AppError::Validation(format!(
            "Role must be one of: {ROLE_ADMIN}, {ROLE_USER}"
        ))),
    }
}

pub fn validate_display_name(name: &str) -> Result<String, AppError> {
    required_name(name, "Display name")
}
