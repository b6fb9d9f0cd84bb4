//! Settlement core: the batch procedures that were `pg_cron` stored
//! procedures in the previous deployment.
//!
//! Both procedures are parameterless, idempotent, and safe to invoke on
//! demand. Serialization is enforced at the database level: finalization
//! locks the window row and re-checks its status, and every balance
//! mutation locks the vendor row first, so overlapping runs can never
//! double-debit an order.

pub mod finalize;
pub mod suspension;

pub use finalize::{FinalizeReport, WindowOutcome, finalize_expired_windows};
pub use suspension::{SuspensionReport, suspend_overdue_vendors};

use thiserror::Error;

/// Only database-level failures exist here; the balance guard is an
/// outcome (order marked failed), not an error.
#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
