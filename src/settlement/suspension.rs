//! Vendor suspension sweep
//!
//! Deactivates every active vendor holding at least one pay-later order
//! that is still pending past its due date. One set-based statement, so a
//! database error aborts the whole sweep atomically; re-running after
//! suspension is a no-op for already-inactive vendors.

use super::SettlementError;
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct SuspensionReport {
    pub vendors_suspended: usize,
    pub vendor_ids: Vec<Uuid>,
}

pub async fn suspend_overdue_vendors(pool: &PgPool) -> Result<SuspensionReport, SettlementError> {
    let rows = sqlx::query(
        r#"UPDATE vendor_profiles vp
           SET is_active = FALSE, updated_at = CURRENT_TIMESTAMP
           WHERE vp.is_active
             AND EXISTS (
                 SELECT 1 FROM orders o
                 WHERE o.buyer_id = vp.user_profile_id
                   AND o.order_type = 'buy_now_pay_later'
                   AND o.payment_status = 'pending'
                   AND o.due_date < CURRENT_TIMESTAMP
             )
           RETURNING vp.id"#,
    )
    .fetch_all(pool)
    .await?;

    let vendor_ids: Vec<Uuid> = rows.iter().map(|r| r.get("id")).collect();
    for vendor_id in &vendor_ids {
        tracing::warn!(
            target: "SETTLEMENT",
            vendor_id = %vendor_id,
            "vendor suspended for overdue pay-later order"
        );
    }
    tracing::info!(
        target: "SETTLEMENT",
        suspended = vendor_ids.len(),
        "suspension sweep complete"
    );

    Ok(SuspensionReport {
        vendors_suspended: vendor_ids.len(),
        vendor_ids,
    })
}
