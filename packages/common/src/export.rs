//! Column registry and projection plan for CSV exports.

use thiserror::Error;

use crate::csv::Cell;
use crate::record::{FilingRecord, Relation, RelationSet};
use crate::repository::QueryError;

/// A field stored on the filing record itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordField {
    Id,
    Title,
    ProductCategory,
    FacilitationYear,
    Notes,
    CertificatePath,
    CreatedAt,
    UpdatedAt,
}

/// A field read from a related row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelatedField {
    Id,
    Name,
    Address,
    Kind,
}

/// Where a column's value comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnSource {
    Direct(RecordField),
    Related(Relation, RelatedField),
}

#[derive(Debug)]
pub struct ColumnDef {
    pub key: &'static str,
    pub label: &'static str,
    pub source: ColumnSource,
}

const fn direct(key: &'static str, label: &'static str, field: RecordField) -> ColumnDef {
    ColumnDef {
        key,
        label,
        source: ColumnSource::Direct(field),
    }
}

const fn related(
    key: &'static str,
    label: &'static str,
    relation: Relation,
    field: RelatedField,
) -> ColumnDef {
    ColumnDef {
        key,
        label,
        source: ColumnSource::Related(relation, field),
    }
}

/// Every exportable column, in catalog order.
pub static COLUMNS: &[ColumnDef] = &[
    direct("id", "ID", RecordField::Id),
    direct("title", "Nama HKI", RecordField::Title),
    direct("product_category", "Jenis Produk", RecordField::ProductCategory),
    related("applicant_name", "Nama Pemohon", Relation::Applicant, RelatedField::Name),
    related(
        "applicant_address",
        "Alamat Pemohon",
        Relation::Applicant,
        RelatedField::Address,
    ),
    related("ip_type_name", "Jenis HKI", Relation::IpType, RelatedField::Name),
    related("ip_class_id", "Kelas HKI", Relation::IpClass, RelatedField::Id),
    related("ip_class_name", "Deskripsi Kelas", Relation::IpClass, RelatedField::Name),
    related("ip_class_kind", "Tipe Kelas", Relation::IpClass, RelatedField::Kind),
    related("agency_name", "Pengusul", Relation::Agency, RelatedField::Name),
    related("status_name", "Status", Relation::Status, RelatedField::Name),
    direct("facilitation_year", "Tahun Fasilitasi", RecordField::FacilitationYear),
    direct("notes", "Keterangan", RecordField::Notes),
    direct("certificate_path", "Sertifikat", RecordField::CertificatePath),
    direct("created_at", "Tanggal Dibuat", RecordField::CreatedAt),
    direct("updated_at", "Tanggal Diperbarui", RecordField::UpdatedAt),
];

pub fn find_column(key: &str) -> Option<&'static ColumnDef> {
    COLUMNS.iter().find(|c| c.key == key)
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Select at least one known column to export")]
    NoColumnsSelected,

    #[error("Unsupported export format '{0}'")]
    UnsupportedFormat(String),

    #[error("No records match the current filters")]
    NoMatchingRecords,

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Columns chosen for one export and the relations they need.
#[derive(Debug)]
pub struct ExportPlan {
    columns: Vec<&'static ColumnDef>,
    relations: RelationSet,
}

impl ExportPlan {
    /// Build a plan from requested keys. Unknown keys are dropped, repeated
    /// keys are kept once in first-requested order.
    pub fn new<S: AsRef<str>>(requested: &[S]) -> Result<Self, ExportError> {
        let mut columns: Vec<&'static ColumnDef> = Vec::new();
        for key in requested {
            if let Some(def) = find_column(key.as_ref().trim())
                && !columns.iter().any(|c| c.key == def.key)
            {
                columns.push(def);
            }
        }

        if columns.is_empty() {
            return Err(ExportError::NoColumnsSelected);
        }

        let relations = columns
            .iter()
            .fold(RelationSet::NONE, |set, def| match def.source {
                ColumnSource::Related(relation, _) => set.with(relation),
                ColumnSource::Direct(_) => set,
            });

        Ok(Self { columns, relations })
    }

    /// Parse the comma-separated `columns` query parameter.
    pub fn from_param(param: &str) -> Result<Self, ExportError> {
        let keys: Vec<&str> = param.split(',').filter(|k| !k.trim().is_empty()).collect();
        Self::new(&keys)
    }

    /// Relations hydration must load; nothing else is fetched.
    pub fn relations(&self) -> RelationSet {
        self.relations
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.key).collect()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.label).collect()
    }

    /// One output row. A missing relation yields empty cells.
    pub fn flatten(&self, record: &FilingRecord) -> Vec<Cell> {
        self.columns
            .iter()
            .map(|def| extract(record, def.source))
            .collect()
    }
}

fn extract(record: &FilingRecord, source: ColumnSource) -> Cell {
    match source {
        ColumnSource::Direct(field) => match field {
            RecordField::Id => Cell::Int(i64::from(record.id)),
            RecordField::Title => Cell::Text(record.title.clone()),
            RecordField::ProductCategory => Cell::text(record.product_category.as_deref()),
            RecordField::FacilitationYear => Cell::int(record.facilitation_year),
            RecordField::Notes => Cell::text(record.notes.as_deref()),
            RecordField::CertificatePath => Cell::text(record.certificate_path.as_deref()),
            RecordField::CreatedAt => Cell::Timestamp(record.created_at),
            RecordField::UpdatedAt => Cell::Timestamp(record.updated_at),
        },
        ColumnSource::Related(relation, field) => extract_related(record, relation, field),
    }
}

fn extract_related(record: &FilingRecord, relation: Relation, field: RelatedField) -> Cell {
    let named = |r: Option<&crate::record::NamedRef>| match (r, field) {
        (Some(r), RelatedField::Id) => Cell::Int(i64::from(r.id)),
        (Some(r), RelatedField::Name) => Cell::Text(r.name.clone()),
        _ => Cell::Empty,
    };

    match relation {
        Relation::Applicant => match (&record.applicant, field) {
            (Some(a), RelatedField::Id) => Cell::Int(i64::from(a.id)),
            (Some(a), RelatedField::Name) => Cell::Text(a.name.clone()),
            (Some(a), RelatedField::Address) => Cell::text(a.address.as_deref()),
            _ => Cell::Empty,
        },
        Relation::IpClass => match (&record.ip_class, field) {
            (Some(c), RelatedField::Id) => Cell::Int(i64::from(c.id)),
            (Some(c), RelatedField::Name) => Cell::Text(c.name.clone()),
            (Some(c), RelatedField::Kind) => Cell::Text(c.kind.to_string()),
            _ => Cell::Empty,
        },
        Relation::IpType => named(record.ip_type.as_ref()),
        Relation::Status => named(record.status.as_ref()),
        Relation::Agency => named(record.agency.as_ref()),
    }
}
