use common::ClassKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Nice classification entry. The id is the class number (1-45) and is
/// chosen by the caller, not generated.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ip_class")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    pub name: String,
    pub kind: ClassKind,

    #[sea_orm(has_many)]
    pub records: HasMany<super::filing_record::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
