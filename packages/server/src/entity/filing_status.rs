use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Filing status. Seeded on startup and read-only over the API.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "filing_status")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(has_many)]
    pub records: HasMany<super::filing_record::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
