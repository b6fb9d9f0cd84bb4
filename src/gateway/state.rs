use std::sync::Arc;

use crate::db::Database;
use crate::orders::OrderService;
use crate::scheduler::JobRunner;

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub orders: Arc<OrderService>,
    pub jobs: Arc<JobRunner>,
    /// Shared secret for /internal endpoints
    pub internal_secret: String,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        orders: Arc<OrderService>,
        jobs: Arc<JobRunner>,
        internal_secret: String,
    ) -> Self {
        Self {
            db,
            orders,
            jobs,
            internal_secret,
        }
    }
}
