//! Raw record readers for the legacy schema segments.
//!
//! Each reader issues one query keyed by `request_id` (the public `nr_num`
//! appears only at entry points), has no side effects, and participates in
//! the caller's existing session or transaction instead of opening its own.
//! Absence is an explicit `None`, never a defaulted record.
//!
//! Readers surface raw `sqlx` errors; the facade maps them to the uniform
//! error taxonomy with per-operation codes.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Row};

use nro_sync_core::StateCode;

use crate::records::{ExamComment, NrApplicant, NrHeader, NrName, NrSubmitter, NwptaRecord};

fn decode_state(code: Option<String>) -> sqlx::Result<Option<StateCode>> {
    match code {
        None => Ok(None),
        Some(raw) => StateCode::parse(&raw).map(Some).ok_or_else(|| {
            sqlx::Error::Decode(format!("malformed legacy state code {raw:?}").into())
        }),
    }
}

/// Read the request header (and its active state code) by public number.
///
/// Returns `None` when the request is unknown to the legacy system — the
/// distinction between "does not exist" and any transient failure.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_nr_header(conn: &mut PgConnection, nr_num: &str) -> sqlx::Result<Option<NrHeader>> {
    let row = sqlx::query(
        r"
        SELECT r.request_id, r.nr_num, r.previous_request_id, r.submit_count,
               r.priority_cd, r.request_type_cd, r.expiration_date,
               r.additional_info, r.nature_business_info, r.xpro_jurisdiction,
               rs.state_type_cd
        FROM request_vw r
        LEFT JOIN request_state rs
               ON rs.request_id = r.request_id AND rs.end_event_id IS NULL
        WHERE r.nr_num = $1
        ",
    )
    .bind(nr_num)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    Ok(Some(NrHeader {
        request_id: row.try_get("request_id")?,
        nr_num: row.try_get("nr_num")?,
        previous_request_id: row.try_get("previous_request_id")?,
        submit_count: row.try_get("submit_count")?,
        priority_cd: row.try_get("priority_cd")?,
        request_type_cd: row.try_get("request_type_cd")?,
        expiration_date: row.try_get("expiration_date")?,
        additional_info: row.try_get("additional_info")?,
        nature_business_info: row.try_get("nature_business_info")?,
        xpro_jurisdiction: row.try_get("xpro_jurisdiction")?,
        state_type_cd: decode_state(row.try_get("state_type_cd")?)?,
    }))
}

/// Read the submitter segment.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_nr_submitter(
    conn: &mut PgConnection,
    request_id: i64,
) -> sqlx::Result<Option<NrSubmitter>> {
    let row = sqlx::query(
        r"
        SELECT submitted_date, submitter
        FROM submitter_vw
        WHERE request_id = $1
        ",
    )
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row
        .map(|row| -> sqlx::Result<NrSubmitter> {
            sqlx::Result::Ok(NrSubmitter {
                submitted_date: row.try_get("submitted_date")?,
                submitter: row.try_get("submitter")?,
            })
        })
        .transpose()?)
}

/// Read the applicant (requester) segment.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_nr_requester(
    conn: &mut PgConnection,
    request_id: i64,
) -> sqlx::Result<Option<NrApplicant>> {
    let row = sqlx::query(
        r"
        SELECT last_name, first_name, middle_name, phone_number, fax_number,
               email_address, address_line_1, address_line_2, address_line_3,
               city, postal_cd, state_province_cd, country_type_cd
        FROM request_party_vw
        WHERE request_id = $1
        ",
    )
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row
        .map(|row| -> sqlx::Result<NrApplicant> {
            sqlx::Result::Ok(NrApplicant {
                last_name: row.try_get("last_name")?,
                first_name: row.try_get("first_name")?,
                middle_name: row.try_get("middle_name")?,
                phone_number: row.try_get("phone_number")?,
                fax_number: row.try_get("fax_number")?,
                email_address: row.try_get("email_address")?,
                address_line_1: row.try_get("address_line_1")?,
                address_line_2: row.try_get("address_line_2")?,
                address_line_3: row.try_get("address_line_3")?,
                city: row.try_get("city")?,
                postal_cd: row.try_get("postal_cd")?,
                state_province_cd: row.try_get("state_province_cd")?,
                country_type_cd: row.try_get("country_type_cd")?,
            })
        })
        .transpose()?)
}

/// Read the examiner comments, oldest first.
///
/// Returns `None` when the request has no comments.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_exam_comments(
    conn: &mut PgConnection,
    request_id: i64,
) -> sqlx::Result<Option<Vec<ExamComment>>> {
    let rows = sqlx::query(
        r"
        SELECT examiner_idir, event_timestamp, examiner_comment
        FROM examiner_comments_vw
        WHERE request_id = $1
        ORDER BY event_timestamp
        ",
    )
    .bind(request_id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut comments = Vec::with_capacity(rows.len());
    for row in rows {
        comments.push(ExamComment {
            examiner_idir: row.try_get("examiner_idir")?,
            event_timestamp: row.try_get("event_timestamp")?,
            examiner_comment: row.try_get("examiner_comment")?,
        });
    }
    Ok(Some(comments))
}

/// Read the NWPTA partner-jurisdiction rows (AB and SK only).
///
/// Returns `None` when the request has no partner cross-references.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_nwpta(
    conn: &mut PgConnection,
    request_id: i64,
) -> sqlx::Result<Option<Vec<NwptaRecord>>> {
    let rows = sqlx::query(
        r"
        SELECT partner_jurisdiction_type_cd, partner_name_type_cd,
               partner_name_number, partner_name_date, partner_name
        FROM partner_name_system_vw
        WHERE request_id = $1
          AND partner_jurisdiction_type_cd IN ('AB', 'SK')
        ",
    )
    .bind(request_id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        records.push(NwptaRecord {
            partner_jurisdiction_type_cd: row.try_get("partner_jurisdiction_type_cd")?,
            partner_name_type_cd: row.try_get("partner_name_type_cd")?,
            partner_name_number: row.try_get("partner_name_number")?,
            partner_name_date: row.try_get("partner_name_date")?,
            partner_name: row.try_get("partner_name")?,
        });
    }
    Ok(Some(records))
}

/// Read the proposed name choices, by choice number.
///
/// Returns `None` when the request has no name rows.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_names(
    conn: &mut PgConnection,
    request_id: i64,
) -> sqlx::Result<Option<Vec<NrName>>> {
    let rows = sqlx::query(
        r"
        SELECT choice_number, name, designation, name_state_type_cd,
               consumption_date
        FROM names_vw
        WHERE request_id = $1
        ORDER BY choice_number
        ",
    )
    .bind(request_id)
    .fetch_all(&mut *conn)
    .await?;

    if rows.is_empty() {
        return Ok(None);
    }

    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push(NrName {
            choice_number: row.try_get("choice_number")?,
            name: row.try_get("name")?,
            designation: row.try_get("designation")?,
            name_state_type_cd: decode_state(row.try_get("name_state_type_cd")?)?,
            consumption_date: row.try_get("consumption_date")?,
        });
    }
    Ok(Some(names))
}

/// UTC timestamp of the most recent change across all segments of a
/// request, or `None` if the request does not exist.
///
/// Keyed by the internal `request_id` on purpose: resolving the public
/// number first costs another join and runs orders of magnitude slower on
/// the legacy schema.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_last_update_timestamp(
    conn: &mut PgConnection,
    request_id: i64,
) -> sqlx::Result<Option<DateTime<Utc>>> {
    let row = sqlx::query(
        r"
        SELECT last_update
        FROM req_instance_max_event
        WHERE request_id = $1
        ",
    )
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|row| row.try_get("last_update")).transpose()
}

/// The single active state code for a request, or `None` when the request
/// is unknown or has no open state row.
///
/// # Errors
///
/// Propagates the underlying database error.
pub async fn get_current_request_state(
    conn: &mut PgConnection,
    nr_num: &str,
) -> sqlx::Result<Option<StateCode>> {
    let row = sqlx::query(
        r"
        SELECT rs.state_type_cd
        FROM request_state rs
        JOIN request r ON rs.request_id = r.request_id
        WHERE r.nr_num = $1
          AND rs.end_event_id IS NULL
        ",
    )
    .bind(nr_num)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        None => Ok(None),
        Some(row) => decode_state(row.try_get("state_type_cd")?),
    }
}
