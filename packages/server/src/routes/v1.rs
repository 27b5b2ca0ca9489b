use axum::extract::DefaultBodyLimit;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{auth, files, master, records, users};
use crate::state::AppState;

/// Room for the text fields of a record form on top of the certificate.
const FORM_FIELDS_ALLOWANCE: u64 = 1024 * 1024;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/records", record_routes(config))
        .nest("/master", master_routes())
        .nest("/users", user_routes())
        .nest("/files", file_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn record_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let body_limit = config
        .storage
        .max_upload_size
        .saturating_add(FORM_FIELDS_ALLOWANCE);

    OpenApiRouter::new()
        .routes(routes!(records::list_records, records::create_record))
        .routes(routes!(records::record_options))
        .routes(routes!(records::export_records))
        .routes(routes!(records::bulk_delete_records))
        .routes(routes!(
            records::get_record,
            records::update_record,
            records::delete_record
        ))
        .routes(routes!(records::certificate_url))
        .layer(DefaultBodyLimit::max(
            usize::try_from(body_limit).unwrap_or(usize::MAX),
        ))
}

fn master_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(master::list_statuses))
        .routes(routes!(master::list_master_rows, master::create_master_row))
        .routes(routes!(master::update_master_row, master::delete_master_row))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(users::list_users, users::create_user))
        .routes(routes!(users::update_user, users::delete_user))
}

fn file_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(files::download_file))
}
