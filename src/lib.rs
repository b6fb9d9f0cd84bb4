//! UstaadCart - B2B Marketplace Settlement Service
//!
//! Backend service connecting street vendors with wholesale suppliers:
//! order lifecycle, vendor balances, and the batch settlement jobs.
//!
//! # Modules
//!
//! - [`config`] - YAML application configuration
//! - [`db`] - PostgreSQL connection pool
//! - [`profiles`] - User/vendor/supplier profile storage
//! - [`catalog`] - Products and bulk pricing tiers
//! - [`orders`] - Checkout, pay-later payments, bulk order windows
//! - [`settlement`] - Vendor suspension and window finalization sweeps
//! - [`scheduler`] - In-process replacement for the cron triggers
//! - [`notify`] - Settlement notifications (rendering + delivery seam)
//! - [`gateway`] - Internal HTTP API

pub mod config;
pub mod db;
pub mod logging;

pub mod catalog;
pub mod notify;
pub mod orders;
pub mod profiles;
pub mod scheduler;
pub mod settlement;

pub mod gateway;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use db::Database;
pub use notify::{LogNotifier, Notifier};
pub use orders::{OrderError, OrderPolicy, OrderService};
pub use scheduler::JobRunner;
pub use settlement::{
    FinalizeReport, SettlementError, SuspensionReport, finalize_expired_windows,
    suspend_overdue_vendors,
};
