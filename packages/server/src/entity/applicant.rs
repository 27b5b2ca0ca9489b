use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The person or business filing. `name` is the dedup key: creating a record
/// for an existing name reuses the row and overwrites its address.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "applicant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,

    #[sea_orm(has_many)]
    pub records: HasMany<super::filing_record::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
