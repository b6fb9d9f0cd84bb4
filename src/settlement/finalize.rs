//! Bulk order window finalization sweep
//!
//! Each expired open window settles inside its own transaction: the window
//! row is locked and its status re-checked under the lock, which makes
//! finalization exactly-once even if two sweeps overlap. A window that
//! fails mid-settlement rolls back whole; the remaining windows still run.

use super::SettlementError;
use crate::notify::{Notifier, WindowFinalizedNotice};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct WindowOutcome {
    pub window_id: Uuid,
    pub title: String,
    pub total_participants: i32,
    pub total_amount: Decimal,
    pub orders_paid: usize,
    pub orders_failed: usize,
    /// Sum actually debited; excludes failed orders
    pub amount_settled: Decimal,
}

#[derive(Debug, Default, Serialize)]
pub struct FinalizeReport {
    pub windows_finalized: usize,
    pub orders_paid: usize,
    pub orders_failed: usize,
    pub amount_settled: Decimal,
    pub windows: Vec<WindowOutcome>,
}

pub async fn finalize_expired_windows(
    pool: &PgPool,
    notifier: &dyn Notifier,
) -> Result<FinalizeReport, SettlementError> {
    let candidates: Vec<Uuid> = sqlx::query_scalar(
        r#"SELECT id FROM bulk_order_windows
           WHERE status = 'open' AND window_end_time < CURRENT_TIMESTAMP
           ORDER BY window_end_time ASC"#,
    )
    .fetch_all(pool)
    .await?;

    let mut report = FinalizeReport::default();
    for window_id in candidates {
        // A concurrent sweep may have won the race for this window; that
        // shows up as None and is not an error
        if let Some(outcome) = finalize_window(pool, window_id).await? {
            report.windows_finalized += 1;
            report.orders_paid += outcome.orders_paid;
            report.orders_failed += outcome.orders_failed;
            report.amount_settled += outcome.amount_settled;

            notifier
                .window_finalized(&WindowFinalizedNotice {
                    window_id: outcome.window_id,
                    title: outcome.title.clone(),
                    participants: outcome.total_participants,
                    orders_paid: outcome.orders_paid,
                    orders_failed: outcome.orders_failed,
                    total_amount: outcome.total_amount,
                })
                .await;

            report.windows.push(outcome);
        }
    }

    tracing::info!(
        target: "SETTLEMENT",
        windows = report.windows_finalized,
        paid = report.orders_paid,
        failed = report.orders_failed,
        amount = %report.amount_settled,
        "finalization sweep complete"
    );
    Ok(report)
}

/// Settle a single window. Returns None when the window was already
/// finalized by the time we held its lock.
async fn finalize_window(
    pool: &PgPool,
    window_id: Uuid,
) -> Result<Option<WindowOutcome>, SettlementError> {
    let mut tx = pool.begin().await?;

    let window_row = sqlx::query(
        r#"SELECT id, title, status FROM bulk_order_windows WHERE id = $1 FOR UPDATE"#,
    )
    .bind(window_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(window_row) = window_row else {
        return Ok(None);
    };
    let status: String = window_row.get("status");
    if status != "open" {
        // Lost the race: another run finalized it while we waited on the lock
        return Ok(None);
    }
    let title: String = window_row.get("title");

    // Freeze the aggregates over all orders in the window
    let agg = sqlx::query(
        r#"SELECT COUNT(DISTINCT buyer_id) AS participants,
                  COALESCE(SUM(total_amount), 0) AS total
           FROM orders WHERE bulk_order_window_id = $1"#,
    )
    .bind(window_id)
    .fetch_one(&mut *tx)
    .await?;
    let total_participants: i64 = agg.get("participants");
    let total_amount: Decimal = agg.get("total");

    sqlx::query(
        r#"UPDATE bulk_order_windows
           SET status = 'finalized', total_participants = $2, total_amount = $3,
               updated_at = CURRENT_TIMESTAMP
           WHERE id = $1"#,
    )
    .bind(window_id)
    .bind(total_participants as i32)
    .bind(total_amount)
    .execute(&mut *tx)
    .await?;

    // Settle each pending order against its vendor balance
    let pending = sqlx::query(
        r#"SELECT id, buyer_id, total_amount FROM orders
           WHERE bulk_order_window_id = $1 AND payment_status = 'pending'
           ORDER BY created_at ASC"#,
    )
    .bind(window_id)
    .fetch_all(&mut *tx)
    .await?;

    let mut orders_paid = 0usize;
    let mut orders_failed = 0usize;
    let mut amount_settled = Decimal::ZERO;

    for order_row in &pending {
        let order_id: Uuid = order_row.get("id");
        let buyer_id: Uuid = order_row.get("buyer_id");
        let amount: Decimal = order_row.get("total_amount");

        let vendor_row = sqlx::query(
            r#"SELECT id, balance FROM vendor_profiles
               WHERE user_profile_id = $1 FOR UPDATE"#,
        )
        .bind(buyer_id)
        .fetch_optional(&mut *tx)
        .await?;

        let settled = match vendor_row {
            None => {
                // Buyer has no vendor profile; nothing to debit
                tracing::warn!(
                    target: "SETTLEMENT",
                    order_id = %order_id,
                    buyer_id = %buyer_id,
                    "order failed: buyer has no vendor profile"
                );
                false
            }
            Some(v) => {
                let vendor_id: Uuid = v.get("id");
                let balance: Decimal = v.get("balance");
                if balance < amount {
                    tracing::warn!(
                        target: "SETTLEMENT",
                        order_id = %order_id,
                        vendor_id = %vendor_id,
                        amount = %amount,
                        balance = %balance,
                        "order failed: insufficient balance"
                    );
                    false
                } else {
                    let after: Decimal = sqlx::query_scalar(
                        r#"UPDATE vendor_profiles
                           SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
                           WHERE id = $2
                           RETURNING balance"#,
                    )
                    .bind(amount)
                    .bind(vendor_id)
                    .fetch_one(&mut *tx)
                    .await?;
                    // Post-debit re-check: paid only if the balance stayed
                    // non-negative
                    after >= Decimal::ZERO
                }
            }
        };

        let new_status = if settled { "paid" } else { "failed" };
        sqlx::query(
            r#"UPDATE orders SET payment_status = $2, updated_at = CURRENT_TIMESTAMP
               WHERE id = $1"#,
        )
        .bind(order_id)
        .bind(new_status)
        .execute(&mut *tx)
        .await?;

        if settled {
            orders_paid += 1;
            amount_settled += amount;
        } else {
            orders_failed += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        target: "SETTLEMENT",
        window_id = %window_id,
        participants = total_participants,
        total = %total_amount,
        paid = orders_paid,
        failed = orders_failed,
        "window finalized"
    );

    Ok(Some(WindowOutcome {
        window_id,
        title,
        total_participants: total_participants as i32,
        total_amount,
        orders_paid,
        orders_failed,
        amount_settled,
    }))
}
