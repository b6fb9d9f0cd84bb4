//! Settlement sweep properties, exercised against a real Postgres.
//!
//! Run with: cargo test --test settlement_pg -- --ignored

mod common;

use chrono::{Duration, Utc};
use common::*;
use rust_decimal::Decimal;
use ustaadcart::notify::LogNotifier;
use ustaadcart::settlement::{finalize_expired_windows, suspend_overdue_vendors};

#[tokio::test]
#[ignore] // Requires PostgreSQL with migrations applied
async fn suspension_leaves_non_overdue_vendors_alone() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let quiet = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    let current = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    create_order_row(
        pool,
        current.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "buy_now_pay_later",
        "pending",
        Some(Utc::now() + Duration::days(3)),
        None,
    )
    .await;

    suspend_overdue_vendors(pool).await.expect("sweep runs");

    assert!(vendor_active(pool, quiet.vendor_id).await);
    assert!(
        vendor_active(pool, current.vendor_id).await,
        "pay-later order not yet due must not suspend"
    );
}

#[tokio::test]
#[ignore]
async fn suspension_suspends_overdue_and_is_idempotent() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let overdue = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    create_order_row(
        pool,
        overdue.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "buy_now_pay_later",
        "pending",
        Some(Utc::now() - Duration::days(1)),
        None,
    )
    .await;

    suspend_overdue_vendors(pool).await.expect("first sweep");
    assert!(!vendor_active(pool, overdue.vendor_id).await);

    // Second run is a no-op for the already-inactive vendor
    let report = suspend_overdue_vendors(pool).await.expect("second sweep");
    assert!(!vendor_active(pool, overdue.vendor_id).await);
    assert!(
        !report.vendor_ids.contains(&overdue.vendor_id),
        "already-suspended vendor must not appear in a later report"
    );
}

#[tokio::test]
#[ignore]
async fn suspension_ignores_paid_and_buy_now_orders() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let vendor = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    // Overdue but already paid
    create_order_row(
        pool,
        vendor.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "buy_now_pay_later",
        "paid",
        Some(Utc::now() - Duration::days(2)),
        None,
    )
    .await;
    // Pending but not a pay-later order
    create_order_row(
        pool,
        vendor.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "buy_now",
        "pending",
        None,
        None,
    )
    .await;

    suspend_overdue_vendors(pool).await.expect("sweep runs");
    assert!(vendor_active(pool, vendor.vendor_id).await);
}

#[tokio::test]
#[ignore]
async fn finalization_ignores_future_windows() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let vendor = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    let window = create_window(pool, vendor.profile_id, Utc::now() + Duration::hours(2)).await;
    let order = create_order_row(
        pool,
        vendor.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "bulk_order",
        "pending",
        None,
        Some(window),
    )
    .await;

    finalize_expired_windows(pool, &LogNotifier).await.expect("sweep runs");

    let (status, _, _) = window_state(pool, window).await;
    assert_eq!(status, "open", "future window must stay open");
    assert_eq!(order_payment_status(pool, order).await, "pending");
    assert_eq!(vendor_balance(pool, vendor.vendor_id).await, Decimal::from(100));
}

#[tokio::test]
#[ignore]
async fn finalization_freezes_distinct_buyer_and_amount_aggregates() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let alice = create_vendor(pool, Decimal::from(1000), 4.8, true).await;
    let bob = create_vendor(pool, Decimal::from(1000), 4.8, true).await;
    let window = create_window(pool, alice.profile_id, Utc::now() + Duration::hours(2)).await;

    // Alice joins twice, Bob once: 2 distinct participants, 75 total
    for amount in [40, 10] {
        create_order_row(
            pool,
            alice.profile_id,
            supplier.profile_id,
            supplier.product_id,
            Decimal::from(amount),
            "bulk_order",
            "pending",
            None,
            Some(window),
        )
        .await;
    }
    create_order_row(
        pool,
        bob.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(25),
        "bulk_order",
        "pending",
        None,
        Some(window),
    )
    .await;

    expire_window(pool, window).await;
    finalize_expired_windows(pool, &LogNotifier).await.expect("sweep runs");

    let (status, participants, total) = window_state(pool, window).await;
    assert_eq!(status, "finalized");
    assert_eq!(participants, 2, "participants count distinct buyers");
    assert_eq!(total, Decimal::from(75));
    assert_eq!(vendor_balance(pool, alice.vendor_id).await, Decimal::from(950));
    assert_eq!(vendor_balance(pool, bob.vendor_id).await, Decimal::from(975));
}

#[tokio::test]
#[ignore]
async fn finalization_debits_sufficient_balance_and_marks_paid() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let vendor = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    let window = create_window(pool, vendor.profile_id, Utc::now() + Duration::hours(2)).await;
    let order = create_order_row(
        pool,
        vendor.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "bulk_order",
        "pending",
        None,
        Some(window),
    )
    .await;

    expire_window(pool, window).await;
    finalize_expired_windows(pool, &LogNotifier).await.expect("sweep runs");

    assert_eq!(vendor_balance(pool, vendor.vendor_id).await, Decimal::from(60));
    assert_eq!(order_payment_status(pool, order).await, "paid");
}

#[tokio::test]
#[ignore]
async fn finalization_balance_guard_marks_failed_without_debit() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let vendor = create_vendor(pool, Decimal::from(20), 4.8, true).await;
    let window = create_window(pool, vendor.profile_id, Utc::now() + Duration::hours(2)).await;
    let order = create_order_row(
        pool,
        vendor.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "bulk_order",
        "pending",
        None,
        Some(window),
    )
    .await;

    expire_window(pool, window).await;
    finalize_expired_windows(pool, &LogNotifier).await.expect("sweep runs");

    assert_eq!(
        vendor_balance(pool, vendor.vendor_id).await,
        Decimal::from(20),
        "failed debit must leave the balance untouched"
    );
    assert_eq!(order_payment_status(pool, order).await, "failed");

    let (status, _, total) = window_state(pool, window).await;
    assert_eq!(status, "finalized");
    assert_eq!(total, Decimal::from(40), "aggregates include failed orders");
}

#[tokio::test]
#[ignore]
async fn finalization_rerun_is_a_noop() {
    let db = connect().await;
    let pool = db.pool();

    let supplier = create_supplier_with_product(pool, 1, &[(1, None, 10)]).await;
    let vendor = create_vendor(pool, Decimal::from(100), 4.8, true).await;
    let window = create_window(pool, vendor.profile_id, Utc::now() + Duration::hours(2)).await;
    let order = create_order_row(
        pool,
        vendor.profile_id,
        supplier.profile_id,
        supplier.product_id,
        Decimal::from(40),
        "bulk_order",
        "pending",
        None,
        Some(window),
    )
    .await;

    expire_window(pool, window).await;
    finalize_expired_windows(pool, &LogNotifier).await.expect("first sweep");
    assert_eq!(vendor_balance(pool, vendor.vendor_id).await, Decimal::from(60));

    finalize_expired_windows(pool, &LogNotifier).await.expect("second sweep");

    // No double aggregation, no double debit
    assert_eq!(
        vendor_balance(pool, vendor.vendor_id).await,
        Decimal::from(60),
        "re-running finalization must not debit again"
    );
    assert_eq!(order_payment_status(pool, order).await, "paid");
    let (status, participants, total) = window_state(pool, window).await;
    assert_eq!(status, "finalized");
    assert_eq!(participants, 1);
    assert_eq!(total, Decimal::from(40));
}
