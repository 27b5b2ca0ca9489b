use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "filing_record")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub product_category: Option<String>,
    pub facilitation_year: Option<i32>,
    /// Blob store key of the certificate, e.g. `certificates/<uuid>.pdf`.
    pub certificate_path: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,

    pub applicant_id: i32,
    #[sea_orm(belongs_to, from = "applicant_id", to = "id")]
    pub applicant: HasOne<super::applicant::Entity>,

    pub ip_type_id: i32,
    #[sea_orm(belongs_to, from = "ip_type_id", to = "id")]
    pub ip_type: HasOne<super::ip_type::Entity>,

    pub status_id: i32,
    #[sea_orm(belongs_to, from = "status_id", to = "id")]
    pub status: HasOne<super::filing_status::Entity>,

    pub agency_id: i32,
    #[sea_orm(belongs_to, from = "agency_id", to = "id")]
    pub agency: HasOne<super::proposing_agency::Entity>,

    pub ip_class_id: Option<i32>,
    #[sea_orm(belongs_to, from = "ip_class_id", to = "id")]
    pub ip_class: HasOne<super::ip_class::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
