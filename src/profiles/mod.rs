//! Profile module
//!
//! PostgreSQL-backed storage for user, vendor and supplier profiles.
//! Registration and authentication live in the external auth provider;
//! this service only reads identities and mutates vendor state
//! (activation flag, balance).

pub mod models;
pub mod repository;

// Re-export commonly used types
pub use models::{UserProfile, VendorProfile};
pub use repository::{SupplierRepository, UserProfileRepository, VendorRepository};

// Re-export Database from top-level db module
pub use crate::db::Database;
