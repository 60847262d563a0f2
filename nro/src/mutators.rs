//! Transactional mutators for the legacy state machine.
//!
//! Every mutation follows the same protocol: lease a session, open an
//! explicit transaction on it, run the legacy statements on that
//! transaction's connection only, commit on full success, roll back on any
//! failure before the error (or warning) is constructed. No half-applied
//! state is ever visible outside the transaction.
//!
//! State transitions never update a state code in place: the active
//! (`end_event_id IS NULL`) row is locked, closed, and a new row is opened,
//! both tagged with the same freshly obtained event id. That invariant is
//! enforced in one place, [`transition_state`], used by every manual
//! transition path. The examine path instead calls the vendor stored
//! function, which performs the equivalent transition under its own internal
//! locking (a trusted external assumption).

use sqlx::{PgConnection, Postgres, Row, Transaction};

use nro_sync_core::{
    ChangeFlags, LockAction, NameRequest, NroError, Result, StateCode, Warning, codes,
};

use crate::facade::examiner_name;
use crate::pool::SessionPool;

/// Staff identity written to legacy audit columns for adapter-initiated
/// changes (the adapter acts on behalf of the application, not a user).
pub const STAFF_IDIR: &str = "nro_sync";

fn database_error(code: &'static str, nr_num: &str, err: &sqlx::Error) -> NroError {
    tracing::error!(nr_num = %nr_num, error = %err, "NRO database error");
    NroError::Database { code }
}

fn require_request_id(nr: &NameRequest, code: &'static str) -> Result<i64> {
    nr.request_id.ok_or_else(|| {
        tracing::error!(nr_num = %nr.nr_num, "entity has no legacy request_id");
        NroError::Database { code }
    })
}

async fn rollback_quietly(tx: Transaction<'static, Postgres>, nr_num: &str) {
    if let Err(err) = tx.rollback().await {
        tracing::error!(nr_num = %nr_num, error = %err, "rollback failed");
    }
}

/// Obtain a fresh event id and write its audit row.
///
/// Every unit-of-change in the legacy system is tagged with one of these;
/// all statements of one transaction share the same id.
async fn next_event_id(conn: &mut PgConnection) -> sqlx::Result<i64> {
    let row = sqlx::query("SELECT nextval('event_seq') AS event_id")
        .fetch_one(&mut *conn)
        .await?;
    let event_id: i64 = row.try_get("event_id")?;

    sqlx::query(
        r"
        INSERT INTO event (event_id, event_type_cd, event_timestamp)
        VALUES ($1, 'SYST', now())
        ",
    )
    .bind(event_id)
    .execute(&mut *conn)
    .await?;

    Ok(event_id)
}

/// Write the transaction-audit row tying an event to a request.
async fn create_nro_transaction(
    conn: &mut PgConnection,
    request_id: i64,
    event_id: i64,
    transaction_type: &str,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO "transaction"
            (transaction_id, request_id, transaction_type_cd, event_id, staff_idir)
        VALUES (nextval('transaction_seq'), $1, $2, $3, $4)
        "#,
    )
    .bind(request_id)
    .bind(transaction_type)
    .bind(event_id)
    .bind(STAFF_IDIR)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// The shared state-transition primitive: lock the active state row, close
/// it with `event_id`, and open a new row coded `new_state` by the same
/// event id.
///
/// `SELECT ... FOR UPDATE` serializes concurrent transitions on the same
/// request until this transaction commits or rolls back.
async fn transition_state(
    conn: &mut PgConnection,
    request_id: i64,
    event_id: i64,
    new_state: StateCode,
    examiner: &str,
) -> sqlx::Result<()> {
    let row = sqlx::query(
        r"
        SELECT request_state_id
        FROM request_state
        WHERE request_id = $1
          AND end_event_id IS NULL
        FOR UPDATE
        ",
    )
    .bind(request_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(sqlx::Error::RowNotFound)?;
    let request_state_id: i64 = row.try_get("request_state_id")?;

    sqlx::query(
        r"
        UPDATE request_state
        SET end_event_id = $1
        WHERE request_state_id = $2
        ",
    )
    .bind(event_id)
    .bind(request_state_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r"
        INSERT INTO request_state
            (request_state_id, request_id, state_type_cd, start_event_id,
             end_event_id, examiner_idir, examiner_comment, state_comment, batch_id)
        VALUES (nextval('request_state_seq'), $1, $2, $3, NULL, $4, NULL, NULL, NULL)
        ",
    )
    .bind(request_id)
    .bind(new_state.to_string())
    .bind(event_id)
    .bind(examiner)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Transition the request to "examined" via the vendor stored function.
///
/// The function signature demands an expiry date and a consent flag that
/// this call path does not use; the placeholders stay internal and never
/// leak into the public contract. A non-null return value is a rejection:
/// the transaction is rolled back even though no database error occurred.
///
/// # Errors
///
/// [`NroError::LegacyRejection`] when the function returns a status
/// message, [`NroError::Database`] on any database failure,
/// [`NroError::PoolExhausted`] when no session is available.
pub async fn set_request_state_to_examined(
    pool: &SessionPool,
    nr_num: &str,
    examiner: &str,
) -> Result<()> {
    let mut tx = pool.begin().await?;
    match examine_in_tx(&mut tx, nr_num, examiner).await {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| database_error(codes::UNABLE_TO_SET_STATE, nr_num, &e)),
        Err(err) => {
            rollback_quietly(tx, nr_num).await;
            Err(err)
        }
    }
}

async fn examine_in_tx(
    tx: &mut Transaction<'static, Postgres>,
    nr_num: &str,
    examiner: &str,
) -> Result<()> {
    let row = sqlx::query("SELECT nro_datapump.name_examination($1, $2, $3, $4, $5) AS status")
        .bind(nr_num) // p_nr_number
        .bind(StateCode::EXAMINED.to_string()) // p_status
        .bind("") // p_expiry_date - mandatory, ignored by the function
        .bind("") // p_consent_flag - mandatory, ignored by the function
        .bind(examiner_name(examiner)) // p_examiner_id
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| database_error(codes::UNABLE_TO_SET_STATE, nr_num, &e))?;

    let status: Option<String> = row
        .try_get("status")
        .map_err(|e| database_error(codes::UNABLE_TO_SET_STATE, nr_num, &e))?;

    if let Some(message) = status {
        tracing::error!(nr_num = %nr_num, message = %message, "name_examination rejected the call");
        return Err(NroError::LegacyRejection {
            code: codes::UNABLE_TO_SET_STATE,
            message,
        });
    }

    Ok(())
}

/// Cancel the request.
///
/// No vendor procedure exists for cancellation, so the state history is
/// managed manually: fresh event id, `CANCL` audit row, then the shared
/// lock-close-insert transition to [`StateCode::CANCELLED`] — all inside
/// one transaction.
///
/// # Errors
///
/// [`NroError::Database`] on any failure (after rollback),
/// [`NroError::PoolExhausted`] when no session is available.
pub async fn cancel(pool: &SessionPool, nr: &NameRequest, examiner: &str) -> Result<()> {
    let request_id = require_request_id(nr, codes::UNABLE_TO_SET_STATE)?;
    let mut tx = pool.begin().await?;
    match cancel_in_tx(&mut tx, request_id, examiner)
        .await
        .map_err(|e| database_error(codes::UNABLE_TO_SET_STATE, &nr.nr_num, &e))
    {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| database_error(codes::UNABLE_TO_SET_STATE, &nr.nr_num, &e)),
        Err(err) => {
            rollback_quietly(tx, &nr.nr_num).await;
            Err(err)
        }
    }
}

async fn cancel_in_tx(
    tx: &mut Transaction<'static, Postgres>,
    request_id: i64,
    examiner: &str,
) -> sqlx::Result<()> {
    let event_id = next_event_id(&mut **tx).await?;
    tracing::debug!(request_id, event_id, "cancelling request");
    create_nro_transaction(&mut **tx, request_id, event_id, "CANCL").await?;
    transition_state(
        &mut **tx,
        request_id,
        event_id,
        StateCode::CANCELLED,
        &examiner_name(examiner),
    )
    .await
}

/// Push caller-flagged field changes to NRO under one transaction.
///
/// Soft-fail: on any failure the transaction is rolled back, the entity is
/// restored to its pre-call snapshot, and the caller receives warnings
/// instead of an error — NRO may now be out of sync and needs manual
/// reconciliation. An empty return means full success.
pub async fn update_request_fields(
    pool: &SessionPool,
    nr: &mut NameRequest,
    flags: &ChangeFlags,
) -> Vec<Warning> {
    if !flags.any() {
        return Vec::new();
    }

    let snapshot = nr.clone();
    match update_fields_tx(pool, nr, flags).await {
        Ok(()) => Vec::new(),
        Err(err) => {
            tracing::error!(nr_num = %nr.nr_num, error = %err, "unable to update request in NRO");
            *nr = snapshot;
            vec![Warning::nro_out_of_sync()]
        }
    }
}

async fn update_fields_tx(
    pool: &SessionPool,
    nr: &NameRequest,
    flags: &ChangeFlags,
) -> Result<()> {
    let request_id = require_request_id(nr, codes::UNABLE_TO_UPDATE_REQUEST)?;
    let mut tx = pool.begin().await?;
    match apply_field_changes(&mut tx, nr, request_id, flags)
        .await
        .map_err(|e| database_error(codes::UNABLE_TO_UPDATE_REQUEST, &nr.nr_num, &e))
    {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| database_error(codes::UNABLE_TO_UPDATE_REQUEST, &nr.nr_num, &e)),
        Err(err) => {
            rollback_quietly(tx, &nr.nr_num).await;
            Err(err)
        }
    }
}

async fn apply_field_changes(
    tx: &mut Transaction<'static, Postgres>,
    nr: &NameRequest,
    request_id: i64,
    flags: &ChangeFlags,
) -> sqlx::Result<()> {
    let event_id = next_event_id(&mut **tx).await?;
    create_nro_transaction(&mut **tx, request_id, event_id, "ADMIN").await?;

    if flags.request {
        let done = sqlx::query(
            r"
            UPDATE request
            SET additional_info = $2,
                nature_business_info = $3,
                xpro_jurisdiction = $4
            WHERE request_id = $1
            ",
        )
        .bind(request_id)
        .bind(nr.additional_info.as_deref())
        .bind(nr.nature_business_info.as_deref())
        .bind(nr.xpro_jurisdiction.as_deref())
        .execute(&mut **tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    if flags.previous_request {
        let done = sqlx::query(
            r"
            UPDATE request
            SET previous_request_id = $2
            WHERE request_id = $1
            ",
        )
        .bind(request_id)
        .bind(nr.previous_request_id)
        .execute(&mut **tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    if flags.applicant || flags.address {
        let applicant = nr.applicants.first().ok_or(sqlx::Error::RowNotFound)?;
        let done = sqlx::query(
            r"
            UPDATE request_party
            SET last_name = $2, first_name = $3, middle_name = $4,
                phone_number = $5, fax_number = $6, email_address = $7,
                address_line_1 = $8, address_line_2 = $9, address_line_3 = $10,
                city = $11, postal_cd = $12, state_province_cd = $13,
                country_type_cd = $14
            WHERE request_id = $1
            ",
        )
        .bind(request_id)
        .bind(applicant.last_name.as_deref())
        .bind(applicant.first_name.as_deref())
        .bind(applicant.middle_name.as_deref())
        .bind(applicant.phone_number.as_deref())
        .bind(applicant.fax_number.as_deref())
        .bind(applicant.email_address.as_deref())
        .bind(applicant.address_line_1.as_deref())
        .bind(applicant.address_line_2.as_deref())
        .bind(applicant.address_line_3.as_deref())
        .bind(applicant.city.as_deref())
        .bind(applicant.postal_cd.as_deref())
        .bind(applicant.state_province_cd.as_deref())
        .bind(applicant.country_type_cd.as_deref())
        .execute(&mut **tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    for (flagged, choice) in [
        (flags.name_1, 1_i32),
        (flags.name_2, 2),
        (flags.name_3, 3),
    ] {
        if !flagged {
            continue;
        }
        let name = nr
            .names
            .iter()
            .find(|n| n.choice_number == choice)
            .ok_or(sqlx::Error::RowNotFound)?;
        let done = sqlx::query(
            r"
            UPDATE name_instance
            SET name = $3, designation = $4
            WHERE request_id = $1
              AND choice_number = $2
            ",
        )
        .bind(request_id)
        .bind(choice)
        .bind(name.name.as_deref())
        .bind(name.designation.as_deref())
        .execute(&mut **tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    for (flagged, jurisdiction) in [(flags.nwpta_ab, "AB"), (flags.nwpta_sk, "SK")] {
        if !flagged {
            continue;
        }
        let record = nr
            .partner_name_systems
            .iter()
            .find(|p| p.partner_jurisdiction_type_cd.as_deref() == Some(jurisdiction))
            .ok_or(sqlx::Error::RowNotFound)?;
        let done = sqlx::query(
            r"
            UPDATE partner_name_system
            SET partner_name_type_cd = $3, partner_name_number = $4,
                partner_name_date = $5, partner_name = $6
            WHERE request_id = $1
              AND partner_jurisdiction_type_cd = $2
            ",
        )
        .bind(request_id)
        .bind(jurisdiction)
        .bind(record.partner_name_type_cd.as_deref())
        .bind(record.partner_name_number.as_deref())
        .bind(record.partner_name_date)
        .bind(record.partner_name.as_deref())
        .execute(&mut **tx)
        .await?;
        if done.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
    }

    Ok(())
}

/// Claim or release the legacy-side edit lock for a request.
///
/// Prevents two concurrent editors from both taking ownership. Soft-fail
/// like [`update_request_fields`]: warnings, never an error, entity
/// restored on failure. On success the entity's `checked_out_by` reflects
/// the new holder.
pub async fn checkin_checkout(
    pool: &SessionPool,
    nr: &mut NameRequest,
    action: LockAction,
) -> Vec<Warning> {
    let snapshot = nr.clone();
    match lock_tx(pool, nr, action).await {
        Ok(()) => {
            nr.checked_out_by = match action {
                LockAction::Checkout => Some(STAFF_IDIR.to_string()),
                LockAction::Checkin => None,
            };
            Vec::new()
        }
        Err(err) => {
            tracing::error!(
                nr_num = %nr.nr_num,
                action = ?action,
                error = %err,
                "unable to update request lock in NRO"
            );
            *nr = snapshot;
            vec![Warning::nro_out_of_sync()]
        }
    }
}

async fn lock_tx(pool: &SessionPool, nr: &NameRequest, action: LockAction) -> Result<()> {
    let request_id = require_request_id(nr, codes::UNABLE_TO_UPDATE_REQUEST)?;
    let mut tx = pool.begin().await?;
    match manage_nr_locks(&mut tx, request_id, action)
        .await
        .map_err(|e| database_error(codes::UNABLE_TO_UPDATE_REQUEST, &nr.nr_num, &e))
    {
        Ok(()) => tx
            .commit()
            .await
            .map_err(|e| database_error(codes::UNABLE_TO_UPDATE_REQUEST, &nr.nr_num, &e)),
        Err(err) => {
            rollback_quietly(tx, &nr.nr_num).await;
            Err(err)
        }
    }
}

async fn manage_nr_locks(
    tx: &mut Transaction<'static, Postgres>,
    request_id: i64,
    action: LockAction,
) -> sqlx::Result<()> {
    let event_id = next_event_id(&mut **tx).await?;

    let done = match action {
        LockAction::Checkout => {
            create_nro_transaction(&mut **tx, request_id, event_id, "CHECKOUT").await?;
            // Claim fails when another holder already has the lock.
            sqlx::query(
                r"
                UPDATE request
                SET checked_out_by = $2, checked_out_dt = now()
                WHERE request_id = $1
                  AND (checked_out_by IS NULL OR checked_out_by = $2)
                ",
            )
            .bind(request_id)
            .bind(STAFF_IDIR)
            .execute(&mut **tx)
            .await?
        }
        LockAction::Checkin => {
            create_nro_transaction(&mut **tx, request_id, event_id, "CHECKIN").await?;
            // Release only our own claim.
            sqlx::query(
                r"
                UPDATE request
                SET checked_out_by = NULL, checked_out_dt = NULL
                WHERE request_id = $1
                  AND checked_out_by = $2
                ",
            )
            .bind(request_id)
            .bind(STAFF_IDIR)
            .execute(&mut **tx)
            .await?
        }
    };

    if done.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}
