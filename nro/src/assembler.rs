//! Assembles the domain aggregate from raw legacy records.
//!
//! Pure composition, no I/O: the header is mandatory, every other segment is
//! optional. Absent segments leave the corresponding collections empty —
//! they never error and never produce placeholder records. Whether the
//! header itself exists is decided by the caller (`fetch_and_copy` yields
//! "not found" before assembly ever runs).

use nro_sync_core::{
    Applicant, ExaminerComment, NameChoice, NameRequest, PartnerNameSystem,
};

use crate::records::{ExamComment, NrApplicant, NrHeader, NrName, NrSubmitter, NwptaRecord};

/// Populate the entity from the header and submitter segments.
pub fn apply_header(
    nr: &mut NameRequest,
    header: &NrHeader,
    submitter: Option<&NrSubmitter>,
    synced_by: &str,
) {
    nr.nr_num.clone_from(&header.nr_num);
    nr.request_id = Some(header.request_id);
    nr.state_cd = header.state_type_cd;
    nr.previous_request_id = header.previous_request_id;
    nr.submit_count = header.submit_count;
    nr.priority_cd.clone_from(&header.priority_cd);
    nr.request_type_cd.clone_from(&header.request_type_cd);
    nr.expiration_date = header.expiration_date;
    nr.additional_info.clone_from(&header.additional_info);
    nr.nature_business_info
        .clone_from(&header.nature_business_info);
    nr.xpro_jurisdiction.clone_from(&header.xpro_jurisdiction);
    nr.synced_by = Some(synced_by.to_string());

    if let Some(submitter) = submitter {
        nr.submitted_date = submitter.submitted_date;
        nr.submitter.clone_from(&submitter.submitter);
    }
}

/// Replace the entity's applicant list from the applicant segment.
pub fn apply_applicant(nr: &mut NameRequest, applicant: &NrApplicant) {
    nr.applicants = vec![Applicant {
        last_name: applicant.last_name.clone(),
        first_name: applicant.first_name.clone(),
        middle_name: applicant.middle_name.clone(),
        phone_number: applicant.phone_number.clone(),
        fax_number: applicant.fax_number.clone(),
        email_address: applicant.email_address.clone(),
        address_line_1: applicant.address_line_1.clone(),
        address_line_2: applicant.address_line_2.clone(),
        address_line_3: applicant.address_line_3.clone(),
        city: applicant.city.clone(),
        postal_cd: applicant.postal_cd.clone(),
        state_province_cd: applicant.state_province_cd.clone(),
        country_type_cd: applicant.country_type_cd.clone(),
    }];
}

/// Replace the entity's comment list from the examiner-comment segment.
pub fn apply_comments(nr: &mut NameRequest, comments: &[ExamComment]) {
    nr.comments = comments
        .iter()
        .map(|comment| ExaminerComment {
            examiner_idir: comment.examiner_idir.clone(),
            event_timestamp: comment.event_timestamp,
            comment: comment.examiner_comment.clone(),
        })
        .collect();
}

/// Replace the entity's partner cross-references from the NWPTA segment.
pub fn apply_nwpta(nr: &mut NameRequest, records: &[NwptaRecord]) {
    nr.partner_name_systems = records
        .iter()
        .map(|record| PartnerNameSystem {
            partner_jurisdiction_type_cd: record.partner_jurisdiction_type_cd.clone(),
            partner_name_type_cd: record.partner_name_type_cd.clone(),
            partner_name_number: record.partner_name_number.clone(),
            partner_name_date: record.partner_name_date,
            partner_name: record.partner_name.clone(),
        })
        .collect();
}

/// Replace the entity's name choices from the names segment.
pub fn apply_names(nr: &mut NameRequest, names: &[NrName]) {
    nr.names = names
        .iter()
        .map(|name| NameChoice {
            choice_number: name.choice_number,
            name: name.name.clone(),
            designation: name.designation.clone(),
            name_state_cd: name.name_state_type_cd,
            consumption_date: name.consumption_date,
        })
        .collect();
}

/// Compose the full entity from the header and the optional segments.
#[allow(clippy::too_many_arguments)]
pub fn assemble(
    nr: &mut NameRequest,
    header: &NrHeader,
    submitter: Option<&NrSubmitter>,
    applicant: Option<&NrApplicant>,
    comments: Option<&Vec<ExamComment>>,
    nwpta: Option<&Vec<NwptaRecord>>,
    names: Option<&Vec<NrName>>,
    synced_by: &str,
) {
    apply_header(nr, header, submitter, synced_by);
    if let Some(applicant) = applicant {
        apply_applicant(nr, applicant);
    }
    if let Some(comments) = comments {
        apply_comments(nr, comments);
    }
    if let Some(nwpta) = nwpta {
        apply_nwpta(nr, nwpta);
    }
    if let Some(names) = names {
        apply_names(nr, names);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use nro_sync_core::StateCode;

    fn header() -> NrHeader {
        NrHeader {
            request_id: 882,
            nr_num: "NR 1234567".to_string(),
            previous_request_id: None,
            submit_count: Some(1),
            priority_cd: Some("N".to_string()),
            request_type_cd: Some("CR".to_string()),
            expiration_date: None,
            additional_info: Some("restaurant chain".to_string()),
            nature_business_info: Some("food service".to_string()),
            xpro_jurisdiction: None,
            state_type_cd: Some(StateCode::DRAFT),
        }
    }

    #[test]
    fn test_header_is_mandatory_segments_optional() {
        let mut nr = NameRequest::new("NR 1234567");
        assemble(&mut nr, &header(), None, None, None, None, None, "jsmith");

        assert_eq!(nr.request_id, Some(882));
        assert_eq!(nr.state_cd, Some(StateCode::DRAFT));
        assert_eq!(nr.synced_by.as_deref(), Some("jsmith"));
        // Absent segments leave collections empty rather than erroring.
        assert!(nr.applicants.is_empty());
        assert!(nr.comments.is_empty());
        assert!(nr.partner_name_systems.is_empty());
        assert!(nr.names.is_empty());
    }

    #[test]
    fn test_submitter_fills_submission_fields() {
        let submitted = Utc.with_ymd_and_hms(2019, 3, 8, 17, 30, 0).single();
        let submitter = NrSubmitter {
            submitted_date: submitted,
            submitter: Some("webform".to_string()),
        };

        let mut nr = NameRequest::new("NR 1234567");
        apply_header(&mut nr, &header(), Some(&submitter), "jsmith");
        assert_eq!(nr.submitted_date, submitted);
        assert_eq!(nr.submitter.as_deref(), Some("webform"));
    }

    #[test]
    fn test_full_assembly_populates_all_collections() {
        let applicant = NrApplicant {
            last_name: Some("DOE".to_string()),
            first_name: Some("JANE".to_string()),
            city: Some("VICTORIA".to_string()),
            ..NrApplicant::default()
        };
        let comments = vec![ExamComment {
            examiner_idir: Some("EX/jsmith".to_string()),
            event_timestamp: Utc.with_ymd_and_hms(2019, 3, 9, 9, 0, 0).single(),
            examiner_comment: Some("conflicts with NR 0000001".to_string()),
        }];
        let nwpta = vec![NwptaRecord {
            partner_jurisdiction_type_cd: Some("AB".to_string()),
            partner_name_type_cd: Some("AS".to_string()),
            partner_name_number: Some("123456".to_string()),
            partner_name_date: None,
            partner_name: Some("ACME AB LTD".to_string()),
        }];
        let names = vec![
            NrName {
                choice_number: 1,
                name: Some("ACME WIDGETS LTD".to_string()),
                designation: Some("LTD".to_string()),
                name_state_type_cd: None,
                consumption_date: None,
            },
            NrName {
                choice_number: 2,
                name: Some("ACME GADGETS LTD".to_string()),
                designation: Some("LTD".to_string()),
                name_state_type_cd: None,
                consumption_date: None,
            },
        ];

        let mut nr = NameRequest::new("NR 1234567");
        assemble(
            &mut nr,
            &header(),
            None,
            Some(&applicant),
            Some(&comments),
            Some(&nwpta),
            Some(&names),
            "jsmith",
        );

        assert_eq!(nr.applicants.len(), 1);
        assert_eq!(nr.applicants[0].last_name.as_deref(), Some("DOE"));
        assert_eq!(nr.comments.len(), 1);
        assert_eq!(
            nr.comments[0].comment.as_deref(),
            Some("conflicts with NR 0000001")
        );
        assert_eq!(nr.partner_name_systems.len(), 1);
        assert_eq!(
            nr.partner_name_systems[0]
                .partner_jurisdiction_type_cd
                .as_deref(),
            Some("AB")
        );
        assert_eq!(nr.names.len(), 2);
        assert_eq!(nr.names[1].choice_number, 2);
    }

    #[test]
    fn test_reassembly_replaces_stale_collections() {
        // A re-sync of an existing local entity must not append duplicates.
        let mut nr = NameRequest::new("NR 1234567");
        let names = vec![NrName {
            choice_number: 1,
            name: Some("OLD NAME LTD".to_string()),
            designation: None,
            name_state_type_cd: None,
            consumption_date: None,
        }];
        apply_names(&mut nr, &names);

        let renamed = vec![NrName {
            choice_number: 1,
            name: Some("NEW NAME LTD".to_string()),
            designation: None,
            name_state_type_cd: None,
            consumption_date: None,
        }];
        apply_names(&mut nr, &renamed);

        assert_eq!(nr.names.len(), 1);
        assert_eq!(nr.names[0].name.as_deref(), Some("NEW NAME LTD"));
    }
}
