//! Order lifecycle: checkout, pay-later payments, bulk order windows
//!
//! Settlement of pending orders lives in [`crate::settlement`]; this module
//! owns creation and the manual payment path.

pub mod error;
pub mod models;
pub mod repository;
pub mod service;

pub use error::OrderError;
pub use models::{BulkOrderWindow, Order, OrderType, PaymentStatus, WindowStatus};
pub use repository::{OrderRepository, WindowRepository};
pub use service::{OrderPolicy, OrderService};
