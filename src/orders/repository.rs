//! Repository layer for orders and bulk windows

use super::models::{BulkOrderWindow, Order, OrderType, PaymentStatus};
use crate::db::SafeRow;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const ORDER_COLUMNS: &str = r#"id, buyer_id, seller_id, product_id, quantity, price_per_unit,
       total_amount, order_type, payment_status, due_date, bulk_order_window_id,
       delivery_address, notes, created_at, updated_at"#;

fn decode_err(e: String) -> sqlx::Error {
    sqlx::Error::Decode(e.into())
}

pub(crate) fn map_order(r: &PgRow) -> Result<Order, sqlx::Error> {
    let order_type: String = r.try_get("order_type")?;
    let payment_status: String = r.try_get("payment_status")?;
    Ok(Order {
        id: r.try_get("id")?,
        buyer_id: r.try_get("buyer_id")?,
        seller_id: r.try_get("seller_id")?,
        product_id: r.try_get("product_id")?,
        quantity: r.try_get("quantity")?,
        price_per_unit: r.try_get("price_per_unit")?,
        total_amount: r.try_get("total_amount")?,
        order_type: order_type.parse().map_err(decode_err)?,
        payment_status: payment_status.parse().map_err(decode_err)?,
        due_date: r.try_get("due_date")?,
        bulk_order_window_id: r.try_get("bulk_order_window_id")?,
        delivery_address: r.try_get("delivery_address")?,
        notes: r.try_get("notes")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

pub(crate) fn map_window(r: &PgRow) -> Result<BulkOrderWindow, sqlx::Error> {
    let status: String = r.try_get("status")?;
    Ok(BulkOrderWindow {
        id: r.try_get("id")?,
        creator_id: r.try_get("creator_id")?,
        title: r.try_get("title")?,
        description: r.try_get("description")?,
        window_start_time: r.try_get("window_start_time")?,
        window_end_time: r.try_get("window_end_time")?,
        status: status.parse().map_err(decode_err)?,
        total_participants: r.try_get("total_participants")?,
        total_amount: r.try_get("total_amount")?,
        created_at: r.try_get("created_at")?,
        updated_at: r.try_get("updated_at")?,
    })
}

/// Order enriched with display fields for listings
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithDetails {
    #[serde(flatten)]
    pub order: Order,
    pub product_name: Option<String>,
    pub product_unit: Option<String>,
    pub seller_name: Option<String>,
    pub buyer_name: Option<String>,
}

fn map_order_with_details(r: &PgRow) -> Result<OrderWithDetails, sqlx::Error> {
    Ok(OrderWithDetails {
        order: map_order(r)?,
        // Joined display fields are best-effort: a deleted product or
        // profile must not break the listing
        product_name: r.try_get_log::<Option<String>>("product_name").flatten(),
        product_unit: r.try_get_log::<Option<String>>("product_unit").flatten(),
        seller_name: r.try_get_log::<Option<String>>("seller_name").flatten(),
        buyer_name: r.try_get_log::<Option<String>>("buyer_name").flatten(),
    })
}

/// Field set for inserting a new order
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub order_type: OrderType,
    pub payment_status: PaymentStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub bulk_order_window_id: Option<Uuid>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

pub struct OrderRepository;

impl OrderRepository {
    /// Insert a new order. Takes any executor so checkout can run it
    /// inside the same transaction as the balance debit.
    pub async fn insert<'e, E>(executor: E, new: &NewOrder) -> Result<Order, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row = sqlx::query(&format!(
            r#"INSERT INTO orders
                   (buyer_id, seller_id, product_id, quantity, price_per_unit, total_amount,
                    order_type, payment_status, due_date, bulk_order_window_id,
                    delivery_address, notes)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(new.buyer_id)
        .bind(new.seller_id)
        .bind(new.product_id)
        .bind(new.quantity)
        .bind(new.price_per_unit)
        .bind(new.total_amount)
        .bind(new.order_type.as_str())
        .bind(new.payment_status.as_str())
        .bind(new.due_date)
        .bind(new.bulk_order_window_id)
        .bind(new.delivery_address.as_deref())
        .bind(new.notes.as_deref())
        .fetch_one(executor)
        .await?;

        map_order(&row)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        row.map(|r| map_order(&r)).transpose()
    }

    /// A buyer's orders, newest first, with optional type/status filters
    pub async fn list_by_buyer(
        pool: &PgPool,
        buyer_id: Uuid,
        order_type: Option<OrderType>,
        payment_status: Option<PaymentStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<OrderWithDetails>, i64), sqlx::Error> {
        let type_filter = order_type.map(OrderType::as_str);
        let status_filter = payment_status.map(PaymentStatus::as_str);

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM orders
               WHERE buyer_id = $1
                 AND ($2::text IS NULL OR order_type = $2)
                 AND ($3::text IS NULL OR payment_status = $3)"#,
        )
        .bind(buyer_id)
        .bind(type_filter)
        .bind(status_filter)
        .fetch_one(pool)
        .await?;

        let offset = (page.saturating_sub(1) as i64) * limit as i64;
        let rows = sqlx::query(
            r#"SELECT o.*, p.name AS product_name, p.unit AS product_unit,
                      COALESCE(seller.display_name, seller.first_name) AS seller_name,
                      NULL::text AS buyer_name
               FROM orders o
               LEFT JOIN products p ON p.id = o.product_id
               LEFT JOIN user_profiles seller ON seller.id = o.seller_id
               WHERE o.buyer_id = $1
                 AND ($2::text IS NULL OR o.order_type = $2)
                 AND ($3::text IS NULL OR o.payment_status = $3)
               ORDER BY o.created_at DESC
               OFFSET $4 LIMIT $5"#,
        )
        .bind(buyer_id)
        .bind(type_filter)
        .bind(status_filter)
        .bind(offset)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        let orders = rows
            .iter()
            .map(map_order_with_details)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((orders, total))
    }

    /// A buyer's pending pay-later orders, soonest due first
    pub async fn pending_pay_later(
        pool: &PgPool,
        buyer_id: Uuid,
    ) -> Result<Vec<OrderWithDetails>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT o.*, p.name AS product_name, p.unit AS product_unit,
                      COALESCE(seller.display_name, seller.first_name) AS seller_name,
                      NULL::text AS buyer_name
               FROM orders o
               LEFT JOIN products p ON p.id = o.product_id
               LEFT JOIN user_profiles seller ON seller.id = o.seller_id
               WHERE o.buyer_id = $1
                 AND o.order_type = 'buy_now_pay_later'
                 AND o.payment_status = 'pending'
               ORDER BY o.due_date ASC"#,
        )
        .bind(buyer_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(map_order_with_details).collect()
    }
}

pub struct WindowRepository;

impl WindowRepository {
    pub async fn create(
        pool: &PgPool,
        creator_id: Uuid,
        title: &str,
        description: Option<&str>,
        window_end_time: DateTime<Utc>,
    ) -> Result<BulkOrderWindow, sqlx::Error> {
        let row = sqlx::query(
            r#"INSERT INTO bulk_order_windows (creator_id, title, description, window_end_time)
               VALUES ($1, $2, $3, $4)
               RETURNING *"#,
        )
        .bind(creator_id)
        .bind(title)
        .bind(description)
        .bind(window_end_time)
        .fetch_one(pool)
        .await?;

        map_window(&row)
    }

    pub async fn get_by_id(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<BulkOrderWindow>, sqlx::Error> {
        let row = sqlx::query(r#"SELECT * FROM bulk_order_windows WHERE id = $1"#)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(|r| map_window(&r)).transpose()
    }

    /// Open, unexpired windows, soonest-closing first
    pub async fn list_open(
        pool: &PgPool,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<BulkOrderWindow>, i64), sqlx::Error> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM bulk_order_windows
               WHERE status = 'open' AND window_end_time > CURRENT_TIMESTAMP"#,
        )
        .fetch_one(pool)
        .await?;

        let offset = (page.saturating_sub(1) as i64) * limit as i64;
        let rows = sqlx::query(
            r#"SELECT * FROM bulk_order_windows
               WHERE status = 'open' AND window_end_time > CURRENT_TIMESTAMP
               ORDER BY window_end_time ASC
               OFFSET $1 LIMIT $2"#,
        )
        .bind(offset)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        let windows = rows
            .iter()
            .map(map_window)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((windows, total))
    }

    /// All orders placed into a window, with buyer display names
    pub async fn orders_in_window(
        pool: &PgPool,
        window_id: Uuid,
    ) -> Result<Vec<OrderWithDetails>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT o.*, p.name AS product_name, p.unit AS product_unit,
                      COALESCE(seller.display_name, seller.first_name) AS seller_name,
                      COALESCE(buyer.display_name, buyer.first_name) AS buyer_name
               FROM orders o
               LEFT JOIN products p ON p.id = o.product_id
               LEFT JOIN user_profiles seller ON seller.id = o.seller_id
               LEFT JOIN user_profiles buyer ON buyer.id = o.buyer_id
               WHERE o.bulk_order_window_id = $1
               ORDER BY o.created_at ASC"#,
        )
        .bind(window_id)
        .fetch_all(pool)
        .await?;

        rows.iter().map(map_order_with_details).collect()
    }
}
