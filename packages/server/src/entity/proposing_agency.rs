use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Government agency that proposed the filing.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "proposing_agency")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub name: String,

    #[sea_orm(has_many)]
    pub records: HasMany<super::filing_record::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
