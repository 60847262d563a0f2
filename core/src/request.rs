//! The `NameRequest` aggregate and its segment value types.
//!
//! A `NameRequest` is the caller-side in-memory aggregate assembled from the
//! legacy record segments (header, submitter, applicant, examiner comments,
//! jurisdiction cross-references, proposed names). The adapter populates and
//! mutates it; persisting it to the application's own store is the caller's
//! `save()` / `add_to_store()` collaborator.
//!
//! The aggregate is `Clone + PartialEq` on purpose: the soft-fail mutators
//! snapshot it before touching NRO and restore the snapshot on failure, and
//! tests assert pre-call equality.

use chrono::{DateTime, Utc};

use crate::state::StateCode;

/// The caller-side name-request aggregate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameRequest {
    /// Public identifier, format `"NR nnnnnnn"`. Secondary key only —
    /// slower to query legacy-side than `request_id`.
    pub nr_num: String,

    /// Legacy internal identifier; the join key for every other segment.
    /// `None` until the request has been fetched from NRO.
    pub request_id: Option<i64>,

    /// Current legacy state code, if known.
    pub state_cd: Option<StateCode>,

    /// Legacy id of the request this one resubmits, if any.
    pub previous_request_id: Option<i64>,

    /// Number of times this request has been submitted.
    pub submit_count: Option<i32>,

    /// Priority flag code.
    pub priority_cd: Option<String>,

    /// Request type code.
    pub request_type_cd: Option<String>,

    /// Expiry of the name reservation.
    pub expiration_date: Option<DateTime<Utc>>,

    /// Free-form additional information.
    pub additional_info: Option<String>,

    /// Nature-of-business description.
    pub nature_business_info: Option<String>,

    /// Extra-provincial jurisdiction, if any.
    pub xpro_jurisdiction: Option<String>,

    /// When the request was submitted to the legacy system.
    pub submitted_date: Option<DateTime<Utc>>,

    /// Who submitted it.
    pub submitter: Option<String>,

    /// Identity of the user that triggered the copy from NRO.
    pub synced_by: Option<String>,

    /// Holder of the legacy-side edit lock, if checked out.
    pub checked_out_by: Option<String>,

    /// Applicant contact records.
    pub applicants: Vec<Applicant>,

    /// Proposed name choices (1 through 3).
    pub names: Vec<NameChoice>,

    /// Examiner comments.
    pub comments: Vec<ExaminerComment>,

    /// NWPTA partner-jurisdiction cross-references.
    pub partner_name_systems: Vec<PartnerNameSystem>,
}

impl NameRequest {
    /// Create an empty request shell for the given public number.
    #[must_use]
    pub fn new(nr_num: impl Into<String>) -> Self {
        Self {
            nr_num: nr_num.into(),
            ..Self::default()
        }
    }
}

/// Applicant contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Applicant {
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

/// One proposed name choice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NameChoice {
    /// Choice slot, 1 through 3.
    pub choice_number: i32,
    /// The proposed name text.
    pub name: Option<String>,
    /// Corporate designation (LTD, INC, ...).
    pub designation: Option<String>,
    /// Per-name decision state, if examined.
    pub name_state_cd: Option<StateCode>,
    /// When the name was consumed by an incorporation, if ever.
    pub consumption_date: Option<DateTime<Utc>>,
}

/// One examiner comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExaminerComment {
    /// Examiner identity as stored legacy-side.
    pub examiner_idir: Option<String>,
    /// When the comment was recorded.
    pub event_timestamp: Option<DateTime<Utc>>,
    /// Comment text.
    pub comment: Option<String>,
}

/// One NWPTA partner-jurisdiction cross-reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerNameSystem {
    /// Partner jurisdiction (AB, SK).
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

/// Which slices of the request a field update should push to NRO.
///
/// `Default` means "nothing changed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeFlags {
    /// Header fields (additional info, nature of business, jurisdiction).
    pub request: bool,
    /// Previous-request linkage.
    pub previous_request: bool,
    /// Applicant contact fields.
    pub applicant: bool,
    /// Applicant address fields.
    pub address: bool,
    /// Name choice 1.
    pub name_1: bool,
    /// Name choice 2.
    pub name_2: bool,
    /// Name choice 3.
    pub name_3: bool,
    /// Alberta partner cross-reference.
    pub nwpta_ab: bool,
    /// Saskatchewan partner cross-reference.
    pub nwpta_sk: bool,
}

impl ChangeFlags {
    /// Returns `true` if any slice is flagged.
    #[must_use]
    pub const fn any(self) -> bool {
        self.request
            || self.previous_request
            || self.applicant
            || self.address
            || self.name_1
            || self.name_2
            || self.name_3
            || self.nwpta_ab
            || self.nwpta_sk
    }
}

/// Direction of the legacy edit-lock operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockAction {
    /// Claim the legacy-side edit lock.
    Checkout,
    /// Release the legacy-side edit lock.
    Checkin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_empty_shell() {
        let nr = NameRequest::new("NR 1234567");
        assert_eq!(nr.nr_num, "NR 1234567");
        assert_eq!(nr.request_id, None);
        assert!(nr.applicants.is_empty());
        assert!(nr.names.is_empty());
        assert!(nr.comments.is_empty());
        assert!(nr.partner_name_systems.is_empty());
    }

    #[test]
    fn test_snapshot_equality_after_clone() {
        let mut nr = NameRequest::new("NR 1234567");
        nr.request_id = Some(42);
        nr.state_cd = Some(StateCode::DRAFT);
        nr.names.push(NameChoice {
            choice_number: 1,
            name: Some("ACME WIDGETS".to_string()),
            ..NameChoice::default()
        });

        let snapshot = nr.clone();
        nr.state_cd = Some(StateCode::CANCELLED);
        nr.names.clear();
        assert_ne!(nr, snapshot);

        nr = snapshot.clone();
        assert_eq!(nr, snapshot);
    }

    #[test]
    fn test_change_flags_default_is_no_change() {
        assert!(!ChangeFlags::default().any());
        let flags = ChangeFlags {
            name_2: true,
            ..ChangeFlags::default()
        };
        assert!(flags.any());
    }
}
