#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest class number in the Nice classification.
pub const MIN_CLASS_ID: i32 = 1;
/// Highest class number in the Nice classification.
pub const MAX_CLASS_ID: i32 = 45;

/// Whether an IP class covers goods or services.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
pub enum ClassKind {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Goods"))]
    Goods,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "Services"))]
    Services,
}

impl ClassKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Goods => "Goods",
            Self::Services => "Services",
        }
    }
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Goods" => Ok(Self::Goods),
            "Services" => Ok(Self::Services),
            other => Err(format!("unknown class kind '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Applicant {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
}

/// A named reference row (IP type, filing status, proposing agency).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IpClass {
    /// Class number, 1-45.
    pub id: i32,
    pub name: String,
    pub kind: ClassKind,
}

/// A filing record with its relations hydrated.
///
/// Relations are `Option` because hydration only loads the relations a caller
/// asked for; an export that never touches the applicant leaves it `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilingRecord {
    pub id: i32,
    pub title: String,
    pub product_category: Option<String>,
    pub facilitation_year: Option<i32>,
    pub certificate_path: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub applicant: Option<Applicant>,
    pub ip_type: Option<NamedRef>,
    pub status: Option<NamedRef>,
    pub agency: Option<NamedRef>,
    pub ip_class: Option<IpClass>,
}

/// The set of relations a hydration pass should load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelationSet {
    pub applicant: bool,
    pub ip_type: bool,
    pub status: bool,
    pub agency: bool,
    pub ip_class: bool,
}

impl RelationSet {
    pub const ALL: Self = Self {
        applicant: true,
        ip_type: true,
        status: true,
        agency: true,
        ip_class: true,
    };

    pub const NONE: Self = Self {
        applicant: false,
        ip_type: false,
        status: false,
        agency: false,
        ip_class: false,
    };

    pub fn with(mut self, relation: Relation) -> Self {
        match relation {
            Relation::Applicant => self.applicant = true,
            Relation::IpType => self.ip_type = true,
            Relation::Status => self.status = true,
            Relation::Agency => self.agency = true,
            Relation::IpClass => self.ip_class = true,
        }
        self
    }

    pub fn contains(&self, relation: Relation) -> bool {
        match relation {
            Relation::Applicant => self.applicant,
            Relation::IpType => self.ip_type,
            Relation::Status => self.status,
            Relation::Agency => self.agency,
            Relation::IpClass => self.ip_class,
        }
    }
}

/// A many-to-one relation of a filing record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Relation {
    Applicant,
    IpType,
    Status,
    Agency,
    IpClass,
}
