//! Structured in-memory records for the legacy schema segments.
//!
//! Each struct maps one legacy record segment, decoded row-by-row from the
//! `*_vw` views. These are the adapter's wire types; the domain aggregate is
//! assembled from them by [`crate::assembler`].

use chrono::{DateTime, Utc};
use nro_sync_core::StateCode;

/// The legacy request header row.
///
/// `request_id` is the join key for every other segment; `nr_num` is the
/// public identifier and is only used at entry points.
#[derive(Debug, Clone, PartialEq)]
pub struct NrHeader {
    /// Legacy internal identifier.
    pub request_id: i64,
    /// Public identifier, format `"NR nnnnnnn"`.
    pub nr_num: String,
    /// Previous request linkage, if resubmitted.
    pub previous_request_id: Option<i64>,
    /// Submission count.
    pub submit_count: Option<i32>,
    /// Priority flag code.
    pub priority_cd: Option<String>,
    /// Request type code.
    pub request_type_cd: Option<String>,
    /// Reservation expiry.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Free-form additional information.
    pub additional_info: Option<String>,
    /// Nature-of-business description.
    pub nature_business_info: Option<String>,
    /// Extra-provincial jurisdiction.
    pub xpro_jurisdiction: Option<String>,
    /// Current state code, if an active state row exists.
    pub state_type_cd: Option<StateCode>,
}

/// The submitter segment.
#[derive(Debug, Clone, PartialEq)]
pub struct NrSubmitter {
    /// When the request was submitted.
    pub submitted_date: Option<DateTime<Utc>>,
    /// Who submitted it.
    pub submitter: Option<String>,
}

/// The applicant (requester) segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NrApplicant {
    /// Last name.
    pub last_name: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Phone number.
    pub phone_number: Option<String>,
    /// Fax number.
    pub fax_number: Option<String>,
    /// Email address.
    pub email_address: Option<String>,
    /// Address line 1.
    pub address_line_1: Option<String>,
    /// Address line 2.
    pub address_line_2: Option<String>,
    /// Address line 3.
    pub address_line_3: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub postal_cd: Option<String>,
    /// Province or state code.
    pub state_province_cd: Option<String>,
    /// Country code.
    pub country_type_cd: Option<String>,
}

/// One examiner-comment row.
#[derive(Debug, Clone, PartialEq)]
pub struct ExamComment {
    /// Examiner identity as stored legacy-side.
    pub examiner_idir: Option<String>,
    /// When the comment was recorded.
    pub event_timestamp: Option<DateTime<Utc>>,
    /// Comment text.
    pub examiner_comment: Option<String>,
}

/// One NWPTA partner-jurisdiction row (AB or SK).
#[derive(Debug, Clone, PartialEq)]
pub struct NwptaRecord {
    /// Partner jurisdiction code.
    pub partner_jurisdiction_type_cd: Option<String>,
    /// Partner record type code.
    pub partner_name_type_cd: Option<String>,
    /// Partner-side name number.
    pub partner_name_number: Option<String>,
    /// Partner-side name date.
    pub partner_name_date: Option<DateTime<Utc>>,
    /// Partner-side name text.
    pub partner_name: Option<String>,
}

/// One proposed-name row.
#[derive(Debug, Clone, PartialEq)]
pub struct NrName {
    /// Choice slot, 1 through 3.
    pub choice_number: i32,
    /// The proposed name text.
    pub name: Option<String>,
    /// Corporate designation.
    pub designation: Option<String>,
    /// Per-name decision state.
    pub name_state_type_cd: Option<StateCode>,
    /// Consumption timestamp, if the name was used.
    pub consumption_date: Option<DateTime<Utc>>,
}
