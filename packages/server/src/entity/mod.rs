pub mod applicant;
pub mod filing_record;
pub mod filing_status;
pub mod ip_class;
pub mod ip_type;
pub mod proposing_agency;
pub mod user_profile;
