use std::fmt;
use std::str::FromStr;

use common::ClassKind;
use common::record::{IpClass, MAX_CLASS_ID, MIN_CLASS_ID, NamedRef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::shared::required_name;

/// The reference tables editable through `/master/{table}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MasterTable {
    IpTypes,
    IpClasses,
    Agencies,
}

impl MasterTable {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::IpTypes => "ip-types",
            Self::IpClasses => "ip-classes",
            Self::Agencies => "agencies",
        }
    }
}

impl fmt::Display for MasterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for MasterTable {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ip-types" => Ok(Self::IpTypes),
            "ip-classes" => Ok(Self::IpClasses),
            "agencies" => Ok(Self::Agencies),
            other => Err(AppError::Validation(format!(
                "Unknown master table '{other}'. Expected one of: ip-types, ip-classes, agencies"
            ))),
        }
    }
}

/// Body for IP types and agencies.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct NamedPayload {
    #[schema(example = "Merek")]
    pub name: String,
}

/// Body for creating an IP class.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct IpClassPayload {
    /// Class number, 1-45.
    #[schema(example = 30)]
    pub id: i32,
    #[schema(example = "Kopi, teh, kakao dan pengganti kopi")]
    pub name: String,
    pub kind: ClassKind,
}

/// Body for updating an IP class. The class number is fixed.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(deny_unknown_fields)]
pub struct IpClassUpdatePayload {
    pub name: String,
    pub kind: ClassKind,
}

/// Create body as documented; the handler picks the variant from the table.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum MasterCreateBody {
    IpClass(IpClassPayload),
    Named(NamedPayload),
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum MasterUpdateBody {
    IpClass(IpClassUpdatePayload),
    Named(NamedPayload),
}

/// A validated create body. Each variant names its table, so a payload can
/// only be written where it belongs.
#[derive(Debug, PartialEq, Eq)]
pub enum MasterCreate {
    IpType { name: String },
    Agency { name: String },
    IpClass { id: i32, name: String, kind: ClassKind },
}

/// A validated update body. The class number of an IP class is fixed.
#[derive(Debug, PartialEq, Eq)]
pub enum MasterUpdate {
    IpType { name: String },
    Agency { name: String },
    IpClass { name: String, kind: ClassKind },
}

fn parse_body<T: DeserializeOwned>(body: serde_json::Value, table: MasterTable) -> Result<T, AppError> {
    serde_json::from_value(body)
        .map_err(|e| AppError::Validation(format!("Invalid body for {table}: {e}")))
}

fn named_body(body: serde_json::Value, table: MasterTable) -> Result<String, AppError> {
    let p: NamedPayload = parse_body(body, table)?;
    required_name(&p.name, "Name")
}

impl MasterCreate {
    pub fn parse(table: MasterTable, body: serde_json::Value) -> Result<Self, AppError> {
        match table {
            MasterTable::IpTypes => Ok(Self::IpType {
                name: named_body(body, table)?,
            }),
            MasterTable::Agencies => Ok(Self::Agency {
                name: named_body(body, table)?,
            }),
            MasterTable::IpClasses => {
                let p: IpClassPayload = parse_body(body, table)?;
                if !(MIN_CLASS_ID..=MAX_CLASS_ID).contains(&p.id) {
                    return Err(AppError::Validation(format!(
                        "Class id must be between {MIN_CLASS_ID} and {MAX_CLASS_ID}"
                    )));
                }
                Ok(Self::IpClass {
                    id: p.id,
                    name: required_name(&p.name, "Name")?,
                    kind: p.kind,
                })
            }
        }
    }

    pub fn table(&self) -> MasterTable {
        match self {
            Self::IpType { .. } => MasterTable::IpTypes,
            Self::Agency { .. } => MasterTable::Agencies,
            Self::IpClass { .. } => MasterTable::IpClasses,
        }
    }
}

impl MasterUpdate {
    pub fn parse(table: MasterTable, body: serde_json::Value) -> Result<Self, AppError> {
        match table {
            MasterTable::IpTypes => Ok(Self::IpType {
                name: named_body(body, table)?,
            }),
            MasterTable::Agencies => Ok(Self::Agency {
                name: named_body(body, table)?,
            }),
            MasterTable::IpClasses => {
                let p: IpClassUpdatePayload = parse_body(body, table)?;
                Ok(Self::IpClass {
                    name: required_name(&p.name, "Name")?,
                    kind: p.kind,
                })
            }
        }
    }

    pub fn table(&self) -> MasterTable {
        match self {
            Self::IpType { .. } => MasterTable::IpTypes,
            Self::Agency { .. } => MasterTable::Agencies,
            Self::IpClass { .. } => MasterTable::IpClasses,
        }
    }
}

/// A reference row. IP classes carry their kind; the other tables are plain
/// id/name pairs.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(untagged)]
pub enum MasterRow {
    Named(NamedRef),
    Class(IpClass),
}
