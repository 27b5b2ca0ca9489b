use common::record::{IpClass, MAX_CLASS_ID, MIN_CLASS_ID, NamedRef};
use common::FilingRecord;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::models::shared::{optional_text, required_name};

pub const MIN_FACILITATION_YEAR: i32 = 1900;
pub const MAX_FACILITATION_YEAR: i32 = 2100;

/// Query parameters of the record listing. Malformed values fall back to
/// their defaults instead of failing the request.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct RecordListParams {
    /// Case-insensitive match on title or applicant name.
    pub search: Option<String>,
    pub type_id: Option<i32>,
    pub status_id: Option<i32>,
    pub year: Option<i32>,
    pub agency_id: Option<i32>,
    /// `createdAt` (default), `title` or `year`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
    /// 1-based page number. Default: 1.
    pub page: Option<u64>,
    /// Rows per page, 1-100. Default: 10.
    pub page_size: Option<u64>,
}

/// Extra parameters of the export endpoint; filters and sort use the same
/// keys as the listing.
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExportParams {
    /// Only `csv` is supported. Default: `csv`.
    pub format: Option<String>,
    /// Comma-separated column keys, e.g. `title,applicant_name`.
    pub columns: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordListResponse {
    pub records: Vec<FilingRecord>,
    #[schema(example = 47)]
    pub total_count: u64,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub page_size: u64,
    #[schema(example = 5)]
    pub total_pages: u64,
}

/// Values for the listing's filter dropdowns.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordOptionsResponse {
    pub ip_types: Vec<NamedRef>,
    pub statuses: Vec<NamedRef>,
    /// Distinct facilitation years, newest first.
    pub years: Vec<i32>,
    pub agencies: Vec<NamedRef>,
    pub ip_classes: Vec<IpClass>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRecordResponse {
    pub deleted_id: i32,
    /// Certificate cleanup problems. The record is deleted regardless.
    pub warnings: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    /// 1-500 distinct positive record ids.
    #[schema(example = json!([4, 8, 15]))]
    pub ids: Vec<i32>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    /// Ids that existed and were removed.
    pub deleted_ids: Vec<i32>,
    pub warnings: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertificateUrlResponse {
    pub signed_url: String,
    #[schema(example = 300)]
    pub expires_in_seconds: u64,
}

/// Multipart form accepted by create and update. Documentation only; the
/// handlers read fields one by one.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[allow(dead_code)]
pub struct RecordForm {
    title: String,
    applicant_name: String,
    applicant_address: Option<String>,
    product_category: Option<String>,
    ip_type_id: i32,
    status_id: i32,
    agency_id: i32,
    /// 1-45.
    ip_class_id: Option<i32>,
    /// 1900-2100.
    facilitation_year: Option<i32>,
    notes: Option<String>,
    /// PDF or image certificate.
    #[schema(value_type = Option<String>, format = Binary)]
    file: Option<Vec<u8>>,
    /// Update only: `true` clears the current certificate.
    remove_certificate: Option<bool>,
}

/// Raw text fields collected from a multipart body.
#[derive(Debug, Default)]
pub struct RecordFormFields {
    title: Option<String>,
    applicant_name: Option<String>,
    applicant_address: Option<String>,
    product_category: Option<String>,
    ip_type_id: Option<String>,
    status_id: Option<String>,
    agency_id: Option<String>,
    ip_class_id: Option<String>,
    facilitation_year: Option<String>,
    notes: Option<String>,
    remove_certificate: Option<String>,
}

impl RecordFormFields {
    /// Record a text field. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        let slot = match name {
            "title" => &mut self.title,
            "applicantName" => &mut self.applicant_name,
            "applicantAddress" => &mut self.applicant_address,
            "productCategory" => &mut self.product_category,
            "ipTypeId" => &mut self.ip_type_id,
            "statusId" => &mut self.status_id,
            "agencyId" => &mut self.agency_id,
            "ipClassId" => &mut self.ip_class_id,
            "facilitationYear" => &mut self.facilitation_year,
            "notes" => &mut self.notes,
            "removeCertificate" => &mut self.remove_certificate,
            _ => return,
        };
        *slot = Some(value);
    }

    pub fn validate(self) -> Result<RecordInput, AppError> {
        let ip_class_id = optional_int(self.ip_class_id, "ipClassId")?;
        if let Some(id) = ip_class_id
            && !(MIN_CLASS_ID..=MAX_CLASS_ID).contains(&id)
        {
            return Err(AppError::Validation(format!(
                "ipClassId must be between {MIN_CLASS_ID} and {MAX_CLASS_ID}"
            )));
        }

        let facilitation_year = optional_int(self.facilitation_year, "facilitationYear")?;
        if let Some(year) = facilitation_year
            && !(MIN_FACILITATION_YEAR..=MAX_FACILITATION_YEAR).contains(&year)
        {
            return Err(AppError::Validation(format!(
                "facilitationYear must be between {MIN_FACILITATION_YEAR} and {MAX_FACILITATION_YEAR}"
            )));
        }

        Ok(RecordInput {
            title: required_name(self.title.as_deref().unwrap_or_default(), "title")?,
            applicant_name: required_name(
                self.applicant_name.as_deref().unwrap_or_default(),
                "applicantName",
            )?,
            applicant_address: optional_text(self.applicant_address),
            product_category: optional_text(self.product_category),
            ip_type_id: required_id(self.ip_type_id, "ipTypeId")?,
            status_id: required_id(self.status_id, "statusId")?,
            agency_id: required_id(self.agency_id, "agencyId")?,
            ip_class_id,
            facilitation_year,
            notes: optional_text(self.notes),
            remove_certificate: self
                .remove_certificate
                .is_some_and(|v| matches!(v.trim(), "true" | "1" | "on")),
        })
    }
}

fn optional_int(value: Option<String>, field: &str) -> Result<Option<i32>, AppError> {
    match optional_text(value) {
        None => Ok(None),
        Some(text) => text
            .parse::<i32>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{field} must be an integer"))),
    }
}

fn required_id(value: Option<String>, field: &str) -> Result<i32, AppError> {
    match optional_int(value, field)? {
        Some(id) if id > 0 => Ok(id),
        _ => Err(AppError::Validation(format!(
            "{field} is required and must be a positive integer"
        ))),
    }
}

/// A validated record form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordInput {
    pub title: String,
    pub applicant_name: String,
    pub applicant_address: Option<String>,
    pub product_category: Option<String>,
    pub ip_type_id: i32,
    pub status_id: i32,
    pub agency_id: i32,
    pub ip_class_id: Option<i32>,
    pub facilitation_year: Option<i32>,
    pub notes: Option<String>,
    pub remove_certificate: bool,
}

/// Certificate bytes read from the `file` part.
pub struct CertificateUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}
