//! The synchronization facade — the public entry point for callers.
//!
//! [`NroService`] owns the connection settings and a lazily created
//! [`SessionPool`] (one pool per execution context, torn down exactly once;
//! teardown is a no-op when nothing was created). It sequences reads and
//! writes, maps legacy error conditions to the uniform taxonomy, and applies
//! each operation's failure policy: reads degrade to "not found", state
//! transitions raise, field/lock updates return warnings.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tokio::sync::OnceCell;

use nro_sync_core::{
    ChangeFlags, LockAction, NameRequest, NroError, Result, StateCode, Warning, codes,
};

use crate::assembler;
use crate::config::NroConfig;
use crate::mutators;
use crate::pool::SessionPool;
use crate::readers;

/// Widest examiner identity the legacy examiner column accepts.
const EXAMINER_NAME_WIDTH: usize = 7;

/// Format an examiner identity for the legacy examiner column.
///
/// Strips any realm prefix (`idir/jsmith` becomes `jsmith`) and truncates
/// to the legacy column width.
#[must_use]
pub fn examiner_name(username: &str) -> String {
    let bare = username.rsplit('/').next().unwrap_or(username);
    bare.chars().take(EXAMINER_NAME_WIDTH).collect()
}

/// Services to read and change the legacy NRO database.
#[derive(Debug)]
pub struct NroService {
    config: Option<NroConfig>,
    pool: OnceCell<SessionPool>,
}

impl NroService {
    /// Create a service; the session pool is created lazily on first use.
    #[must_use]
    pub fn new(config: NroConfig) -> Self {
        Self {
            config: Some(config),
            pool: OnceCell::new(),
        }
    }

    /// Create a service around an existing pool (tests and embedding
    /// applications that manage their own pool lifecycle).
    #[must_use]
    pub fn from_pool(pool: SessionPool) -> Self {
        Self {
            config: None,
            pool: OnceCell::new_with(Some(pool)),
        }
    }

    /// The per-context pool, created on first use.
    async fn session_pool(&self) -> Result<&SessionPool> {
        self.pool
            .get_or_try_init(|| async {
                match &self.config {
                    Some(config) => SessionPool::connect(config).await,
                    None => Err(NroError::Configuration(
                        "service has neither configuration nor a pool".to_string(),
                    )),
                }
            })
            .await
    }

    /// Tear down the session pool.
    ///
    /// Idempotent, and safe when the pool was never created.
    pub async fn teardown(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
        }
    }

    /// UTC timestamp of the most recent change to any segment of the
    /// request, or `None` if the request does not exist.
    ///
    /// Keyed by the internal `request_id`, not the public number — the
    /// extra join the public number needs is materially slower legacy-side.
    ///
    /// # Errors
    ///
    /// [`NroError::Database`] with code `unable_to_get_timestamp` on any
    /// database failure; [`NroError::PoolExhausted`] when no session is
    /// available.
    pub async fn get_last_update_timestamp(
        &self,
        request_id: i64,
    ) -> Result<Option<DateTime<Utc>>> {
        let pool = self.session_pool().await?;
        let mut conn = pool.acquire().await?;
        readers::get_last_update_timestamp(&mut conn, request_id)
            .await
            .map_err(|e| {
                tracing::error!(request_id, error = %e, "unable to get the last update timestamp");
                NroError::Database {
                    code: codes::UNABLE_TO_GET_TIMESTAMP,
                }
            })
    }

    /// The single active state code for the request, or `None` when the
    /// request is unknown.
    ///
    /// # Errors
    ///
    /// [`NroError::Database`] with code `unable_to_get_request_state` on
    /// any database failure; [`NroError::PoolExhausted`] when no session is
    /// available.
    pub async fn get_current_request_state(&self, nr_num: &str) -> Result<Option<StateCode>> {
        let pool = self.session_pool().await?;
        let mut conn = pool.acquire().await?;
        readers::get_current_request_state(&mut conn, nr_num)
            .await
            .map_err(|e| {
                tracing::error!(nr_num = %nr_num, error = %e, "unable to get the current request state");
                NroError::Database {
                    code: codes::UNABLE_TO_GET_REQUEST_STATE,
                }
            })
    }

    /// Transition the request to "examined", associating the examiner.
    ///
    /// # Errors
    ///
    /// Raises on every failure (state transitions are correctness-critical):
    /// [`NroError::LegacyRejection`] when the vendor function rejects the
    /// call, [`NroError::Database`] otherwise. The transaction is rolled
    /// back before the error is surfaced.
    pub async fn set_request_state_to_examined(&self, nr_num: &str, examiner: &str) -> Result<()> {
        let pool = self.session_pool().await?;
        mutators::set_request_state_to_examined(pool, nr_num, examiner).await
    }

    /// Cancel the request.
    ///
    /// # Errors
    ///
    /// Raises [`NroError::Database`] on any failure, after rollback.
    pub async fn cancel(&self, nr: &NameRequest, examiner: &str) -> Result<()> {
        let pool = self.session_pool().await?;
        mutators::cancel(pool, nr, examiner).await
    }

    /// Push caller-flagged field changes to NRO. Never raises: failures
    /// come back as warnings and the entity is restored to its pre-call
    /// state. Empty result means success.
    pub async fn update_request_fields(
        &self,
        nr: &mut NameRequest,
        flags: &ChangeFlags,
    ) -> Vec<Warning> {
        match self.session_pool().await {
            Ok(pool) => mutators::update_request_fields(pool, nr, flags).await,
            Err(err) => {
                tracing::error!(nr_num = %nr.nr_num, error = %err, "no NRO session for field update");
                vec![Warning::nro_out_of_sync()]
            }
        }
    }

    /// Claim or release the legacy-side edit lock. Same soft-fail policy
    /// as [`Self::update_request_fields`].
    pub async fn checkin_checkout(&self, nr: &mut NameRequest, action: LockAction) -> Vec<Warning> {
        match self.session_pool().await {
            Ok(pool) => mutators::checkin_checkout(pool, nr, action).await,
            Err(err) => {
                tracing::error!(nr_num = %nr.nr_num, error = %err, "no NRO session for lock update");
                vec![Warning::nro_out_of_sync()]
            }
        }
    }

    /// Gather a request from NRO and copy it onto a domain entity.
    ///
    /// Uses `existing` when supplied, otherwise a fresh shell (resolving a
    /// previously stored local entity is the caller's lookup). The entity
    /// is *not* persisted here — that is the caller's `save()`.
    ///
    /// Returns `None` both when the request has no header in NRO and when
    /// the read sequence fails (cause logged): read failures mean "could
    /// not confirm existence", never a hard error.
    pub async fn fetch_and_copy(
        &self,
        requester: &str,
        nr_num: &str,
        existing: Option<NameRequest>,
    ) -> Option<NameRequest> {
        let pool = match self.session_pool().await {
            Ok(pool) => pool,
            Err(err) => {
                tracing::debug!(nr_num = %nr_num, error = %err, "no NRO session for fetch");
                return None;
            }
        };
        let mut conn = match pool.acquire().await {
            Ok(conn) => conn,
            Err(err) => {
                tracing::debug!(nr_num = %nr_num, error = %err, "no NRO session for fetch");
                return None;
            }
        };
        match fetch_on_connection(&mut conn, requester, nr_num, existing).await {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(nr_num = %nr_num, error = %err, "unable to load request from NRO");
                None
            }
        }
    }
}

/// Run the whole read sequence on one connection and assemble the entity.
async fn fetch_on_connection(
    conn: &mut PgConnection,
    requester: &str,
    nr_num: &str,
    existing: Option<NameRequest>,
) -> sqlx::Result<Option<NameRequest>> {
    let Some(header) = readers::get_nr_header(conn, nr_num).await? else {
        tracing::info!(nr_num = %nr_num, "request does not exist in NRO");
        return Ok(None);
    };
    tracing::debug!(nr_num = %nr_num, request_id = header.request_id, "fetched request header");

    let submitter = readers::get_nr_submitter(conn, header.request_id).await?;
    let applicant = readers::get_nr_requester(conn, header.request_id).await?;
    let comments = readers::get_exam_comments(conn, header.request_id).await?;
    let nwpta = readers::get_nwpta(conn, header.request_id).await?;
    let names = readers::get_names(conn, header.request_id).await?;

    let mut nr = existing.unwrap_or_else(|| NameRequest::new(nr_num));
    assembler::assemble(
        &mut nr,
        &header,
        submitter.as_ref(),
        applicant.as_ref(),
        comments.as_ref(),
        nwpta.as_ref(),
        names.as_ref(),
        requester,
    );
    Ok(Some(nr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_config() -> NroConfig {
        NroConfig::new("127.0.0.1", 1, "nro", "nobody", "nothing")
            .with_pool_bounds(1, 1)
            .with_acquire_timeout(Duration::from_millis(200))
    }

    #[test]
    fn test_examiner_name_strips_realm_and_truncates() {
        assert_eq!(examiner_name("jsmith"), "jsmith");
        assert_eq!(examiner_name("idir/jsmith"), "jsmith");
        assert_eq!(examiner_name("idir/jonathansmith"), "jonatha");
        assert_eq!(examiner_name(""), "");
    }

    #[tokio::test]
    async fn test_teardown_without_pool_is_safe() {
        let service = NroService::new(unreachable_config());
        // Nothing was ever created; teardown must be a no-op, twice.
        service.teardown().await;
        service.teardown().await;
    }

    #[tokio::test]
    async fn test_fetch_and_copy_never_raises_when_nro_is_down() {
        let service = NroService::new(unreachable_config());
        let found = service.fetch_and_copy("jsmith", "NR 9999999", None).await;
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_fields_degrades_to_warning_when_nro_is_down() {
        let service = NroService::new(unreachable_config());
        let mut nr = NameRequest::new("NR 1234567");
        nr.request_id = Some(42);
        let snapshot = nr.clone();

        let flags = ChangeFlags {
            request: true,
            ..ChangeFlags::default()
        };
        let warnings = service.update_request_fields(&mut nr, &flags).await;

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, codes::UNABLE_TO_UPDATE_REQUEST);
        // Pre-call snapshot equality.
        assert_eq!(nr, snapshot);
    }

    #[tokio::test]
    async fn test_checkin_checkout_degrades_to_warning_when_nro_is_down() {
        let service = NroService::new(unreachable_config());
        let mut nr = NameRequest::new("NR 1234567");
        nr.request_id = Some(42);
        let snapshot = nr.clone();

        let warnings = service.checkin_checkout(&mut nr, LockAction::Checkout).await;

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, nro_sync_core::Severity::Warn);
        assert_eq!(nr, snapshot);
    }

    #[tokio::test]
    async fn test_state_transition_raises_when_nro_is_down() {
        let service = NroService::new(unreachable_config());
        let result = service
            .set_request_state_to_examined("NR 1234567", "jsmith")
            .await;
        assert!(matches!(result, Err(NroError::PoolExhausted)));
    }
}
