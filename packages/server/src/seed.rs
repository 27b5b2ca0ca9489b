use chrono::Utc;
use sea_orm::sea_query::{Index, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::AuthConfig;
use crate::entity::{filing_record, filing_status, user_profile};
use crate::utils::hash;

/// Filing statuses seeded on startup. The set is fixed; there is no API to
/// edit it.
pub const FILING_STATUSES: &[&str] = &["Diterima", "Terdaftar", "Ditolak", "Dalam Proses"];

/// Seed the `filing_status` table.
pub async fn seed_filing_statuses(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for &name in FILING_STATUSES {
        let model = filing_status::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        };

        let result = filing_status::Entity::insert(model)
            .on_conflict(
                OnConflict::column(filing_status::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(n) if n > 0 => inserted += 1,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} filing statuses", inserted);
    }
    Ok(())
}

/// Create the configured super admin if no account with that username
/// exists. Does nothing when no password is configured.
pub async fn seed_super_admin(db: &DatabaseConnection, auth: &AuthConfig) -> Result<(), DbErr> {
    let Some(password) = auth.super_admin_password.as_deref() else {
        return Ok(());
    };

    let existing = user_profile::Entity::find()
        .filter(user_profile::Column::Username.eq(&auth.super_admin_username))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;

    let model = user_profile::ActiveModel {
        username: Set(auth.super_admin_username.clone()),
        display_name: Set("Super Admin".into()),
        role: Set(user_profile::ROLE_ADMIN.into()),
        password: Set(password_hash),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let result = user_profile::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user_profile::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => {
            info!(username = %auth.super_admin_username, "Ensured super admin account");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Ensure required database indexes exist.
///
/// Schema sync only creates the tables, so the listing indexes are created
/// here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        (
            "idx_filing_record_created_id",
            vec![filing_record::Column::CreatedAt, filing_record::Column::Id],
        ),
        ("idx_filing_record_status", vec![filing_record::Column::StatusId]),
        ("idx_filing_record_applicant", vec![filing_record::Column::ApplicantId]),
    ];

    for (name, columns) in indexes {
        let mut index = Index::create();
        index.if_not_exists().name(name).table(filing_record::Entity);
        for column in columns {
            index.col(column);
        }

        match db.execute_unprepared(&index.to_string(PostgresQueryBuilder)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}
