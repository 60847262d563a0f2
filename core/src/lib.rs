//! # NRO Sync Core
//!
//! Domain types shared between the NRO synchronization adapter and its
//! callers: the `NameRequest` aggregate, the legacy single-letter state
//! codes, the adapter error taxonomy, and the per-operation failure
//! policies.
//!
//! This crate deliberately has no database dependencies. The adapter crate
//! (`nro-sync`) populates and mutates these types against the legacy NRO
//! store; persisting them to the application's own store is the caller's
//! responsibility.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod error;
pub mod request;
pub mod state;

pub use error::{FailurePolicy, NroError, Operation, Result, Severity, Warning, codes};
pub use request::{
    Applicant, ChangeFlags, ExaminerComment, LockAction, NameChoice, NameRequest,
    PartnerNameSystem,
};
pub use state::StateCode;
