//! Error taxonomy, warnings and failure policies for NRO operations.
//!
//! The adapter is deliberately inconsistent about failure handling, per
//! operation (see [`Operation::failure_policy`]):
//!
//! - **read-path** failures degrade to "not found" so existence checks stay
//!   resilient;
//! - **state-transition** failures always raise a typed error — they are
//!   correctness-critical and must not be swallowed;
//! - **field/lock-update** failures degrade to [`Warning`]s — best-effort
//!   sync where manual reconciliation is acceptable.

use thiserror::Error;

/// Result type alias for NRO adapter operations.
pub type Result<T> = std::result::Result<T, NroError>;

/// Stable machine-readable failure codes surfaced to callers.
///
/// The code strings are part of the adapter's contract; vendor error detail
/// is logged but never exposed through them.
pub mod codes {
    /// Could not read `req_instance_max_event` for a request.
    pub const UNABLE_TO_GET_TIMESTAMP: &str = "unable_to_get_timestamp";

    /// Could not read the active state row for a request.
    pub const UNABLE_TO_GET_REQUEST_STATE: &str = "unable_to_get_request_state";

    /// A state transition (examine, cancel) failed or was rejected.
    pub const UNABLE_TO_SET_STATE: &str = "unable_to_set_state";

    /// A field or lock update failed; NRO may now be out of sync.
    pub const UNABLE_TO_UPDATE_REQUEST: &str = "unable_to_update_request_changes_in_NRO";
}

/// Error taxonomy for the NRO synchronization adapter.
#[derive(Debug, Error)]
pub enum NroError {
    /// The session pool is exhausted or the legacy database is unreachable.
    ///
    /// Retryable: the caller may back off and try again.
    #[error("NRO session pool exhausted or unavailable")]
    PoolExhausted,

    /// A legacy stored procedure returned a non-null status message,
    /// rejecting the call outright. The transaction was rolled back.
    #[error("NRO rejected the operation: {message}")]
    LegacyRejection {
        /// Stable machine-readable code (see [`codes`]).
        code: &'static str,
        /// The legacy-provided rejection message.
        message: String,
    },

    /// The legacy database failed mid-operation (constraint violation,
    /// deadlock, lost connectivity). The transaction was rolled back; the
    /// vendor error is logged, not carried here.
    #[error("NRO database error ({code})")]
    Database {
        /// Stable machine-readable code (see [`codes`]).
        code: &'static str,
    },

    /// Missing or invalid connection configuration.
    #[error("missing or invalid NRO configuration: {0}")]
    Configuration(String),
}

impl NroError {
    /// The stable machine-readable code for this error.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::PoolExhausted => "nro_pool_exhausted",
            Self::LegacyRejection { code, .. } | Self::Database { code } => code,
            Self::Configuration(_) => "nro_configuration",
        }
    }

    /// Returns `true` if the caller may retry the operation as-is.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted)
    }
}

/// Severity of a non-fatal sync outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Manual reconciliation recommended; the caller's workflow continues.
    Warn,
    /// Reserved for conditions the caller must not ignore.
    Error,
}

/// A non-raising failure outcome, returned as data by the soft-fail
/// operations (`update_request_fields`, `checkin_checkout`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Severity of the condition.
    pub severity: Severity,
    /// Stable machine-readable code (see [`codes`]).
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

impl Warning {
    /// The canonical "NRO is possibly out of sync" warning returned when a
    /// best-effort update fails.
    #[must_use]
    pub fn nro_out_of_sync() -> Self {
        Self {
            severity: Severity::Warn,
            code: codes::UNABLE_TO_UPDATE_REQUEST.to_string(),
            message: "Unable to update the Request details in NRO, please manually verify \
                      record is up to date in NRO before continuing."
                .to_string(),
        }
    }
}

/// The public operations exposed by the synchronization facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `get_last_update_timestamp`
    GetLastUpdateTimestamp,
    /// `get_current_request_state`
    GetCurrentRequestState,
    /// `set_request_state_to_examined`
    SetToExamined,
    /// `cancel`
    Cancel,
    /// `update_request_fields`
    UpdateRequestFields,
    /// `checkin_checkout`
    CheckinCheckout,
    /// `fetch_and_copy`
    FetchAndCopy,
}

/// How an operation surfaces internal failures to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Roll back and raise a typed [`NroError`].
    Raise,
    /// Roll back, restore the caller's entity snapshot, and return
    /// [`Warning`]s instead of raising.
    Warn,
    /// Swallow the failure and report "not found" (cause logged).
    DegradeToNotFound,
}

impl Operation {
    /// The single enumerated failure policy per operation.
    ///
    /// The asymmetry is a design choice inherited from the system of
    /// record, made explicit here so tests can assert it by name.
    #[must_use]
    pub const fn failure_policy(self) -> FailurePolicy {
        match self {
            Self::GetLastUpdateTimestamp
            | Self::GetCurrentRequestState
            | Self::SetToExamined
            | Self::Cancel => FailurePolicy::Raise,
            Self::UpdateRequestFields | Self::CheckinCheckout => FailurePolicy::Warn,
            Self::FetchAndCopy => FailurePolicy::DegradeToNotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_per_operation() {
        // State transitions are correctness-critical and must raise.
        assert_eq!(
            Operation::SetToExamined.failure_policy(),
            FailurePolicy::Raise
        );
        assert_eq!(Operation::Cancel.failure_policy(), FailurePolicy::Raise);

        // Point reads raise on error (absence is a sentinel, not an error).
        assert_eq!(
            Operation::GetLastUpdateTimestamp.failure_policy(),
            FailurePolicy::Raise
        );
        assert_eq!(
            Operation::GetCurrentRequestState.failure_policy(),
            FailurePolicy::Raise
        );

        // Best-effort sync degrades to warnings.
        assert_eq!(
            Operation::UpdateRequestFields.failure_policy(),
            FailurePolicy::Warn
        );
        assert_eq!(
            Operation::CheckinCheckout.failure_policy(),
            FailurePolicy::Warn
        );

        // The read aggregate degrades to NotFound, never raises.
        assert_eq!(
            Operation::FetchAndCopy.failure_policy(),
            FailurePolicy::DegradeToNotFound
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        let rejection = NroError::LegacyRejection {
            code: codes::UNABLE_TO_SET_STATE,
            message: "NR not found".to_string(),
        };
        assert_eq!(rejection.code(), "unable_to_set_state");

        let db = NroError::Database {
            code: codes::UNABLE_TO_GET_TIMESTAMP,
        };
        assert_eq!(db.code(), "unable_to_get_timestamp");
    }

    #[test]
    fn test_only_resource_errors_are_retryable() {
        assert!(NroError::PoolExhausted.is_retryable());
        assert!(
            !NroError::Database {
                code: codes::UNABLE_TO_SET_STATE
            }
            .is_retryable()
        );
        assert!(
            !NroError::LegacyRejection {
                code: codes::UNABLE_TO_SET_STATE,
                message: String::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_out_of_sync_warning_shape() {
        let warning = Warning::nro_out_of_sync();
        assert_eq!(warning.severity, Severity::Warn);
        assert_eq!(warning.code, codes::UNABLE_TO_UPDATE_REQUEST);
        assert!(warning.message.contains("manually verify"));
    }
}
