//! Internal HTTP gateway
//!
//! Order lifecycle endpoints plus the manual settlement triggers. The
//! upstream auth proxy terminates authentication and injects the caller's
//! identity as the X-User-Id header; /internal routes are guarded by a
//! shared secret instead.

pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/internal/jobs/suspend-overdue",
            post(handlers::trigger_suspension),
        )
        .route(
            "/internal/jobs/finalize-windows",
            post(handlers::trigger_finalization),
        )
        .route(
            "/api/v1/orders",
            post(handlers::create_order).get(handlers::my_orders),
        )
        .route(
            "/api/v1/orders/pending-payments",
            get(handlers::pending_payments),
        )
        .route(
            "/api/v1/orders/{order_id}/pay",
            post(handlers::pay_pending_order),
        )
        .route(
            "/api/v1/bulk-windows",
            post(handlers::create_bulk_window).get(handlers::list_bulk_windows),
        )
        .route(
            "/api/v1/bulk-windows/{window_id}",
            get(handlers::bulk_window_detail),
        );

    #[cfg(feature = "mock-api")]
    let router = router.route("/internal/mock/credit", post(handlers::mock_credit));

    router.with_state(state)
}

/// Bind and serve the gateway until shutdown
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind gateway listener on {}: {}", addr, e));

    tracing::info!(target: "GATEWAY", "listening on {}", addr);

    axum::serve(listener, router(state))
        .await
        .expect("gateway server");
}
