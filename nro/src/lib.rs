//! # NRO Synchronization Adapter
//!
//! Keeps the application's "Name Request" domain model in sync with the
//! legacy NRO relational database — the authoritative system of record for
//! corporate name-reservation data, reachable only through raw SQL and
//! stored procedures.
//!
//! Every legacy mutation runs inside an explicit transaction on a pooled
//! session: commit on full success, rollback on any failure, never a
//! half-applied state visible outside the transaction. The read path
//! assembles a full [`NameRequest`](nro_sync_core::NameRequest) by joining
//! the legacy record segments on one connection.
//!
//! Failure handling is deliberately asymmetric per operation (see
//! [`nro_sync_core::Operation::failure_policy`]): reads degrade to "not
//! found", state transitions raise, field/lock updates return warnings.
//!
//! # Example
//!
//! ```no_run
//! use nro_sync::{NroConfig, NroService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = NroService::new(NroConfig::from_env()?);
//! if let Some(state) = service.get_current_request_state("NR 1234567").await? {
//!     println!("NR 1234567 is currently '{state}'");
//! }
//! service.teardown().await;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod assembler;
pub mod config;
pub mod facade;
pub mod mutators;
pub mod pool;
pub mod readers;
pub mod records;

pub use config::NroConfig;
pub use facade::{NroService, examiner_name};
pub use pool::SessionPool;

// Re-export the domain crate so callers need only one dependency.
pub use nro_sync_core as core;
