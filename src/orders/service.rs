//! Order operations: checkout, manual pay-later payment, bulk windows
//!
//! Every multi-step balance mutation runs inside one transaction with the
//! vendor row locked (SELECT ... FOR UPDATE), so a concurrent settlement
//! sweep can never double-debit.

use super::error::OrderError;
use super::models::{BulkOrderWindow, Order, OrderType, PaymentStatus, WindowStatus};
use super::repository::{
    self, NewOrder, OrderRepository, OrderWithDetails, WindowRepository,
};
use crate::catalog::{ProductRepository, price_for_quantity};
use crate::config::JobsConfig;
use crate::db::Database;
use crate::profiles::{SupplierRepository, UserProfileRepository, VendorRepository};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::Row;
use std::sync::Arc;
use uuid::Uuid;

/// Pay-later policy knobs, lifted from the jobs config
#[derive(Debug, Clone, Copy)]
pub struct OrderPolicy {
    pub pay_later_due_days: i64,
    pub pay_later_min_rating: f64,
}

impl Default for OrderPolicy {
    fn default() -> Self {
        Self {
            pay_later_due_days: 5,
            pay_later_min_rating: 4.5,
        }
    }
}

impl From<&JobsConfig> for OrderPolicy {
    fn from(jobs: &JobsConfig) -> Self {
        Self {
            pay_later_due_days: jobs.pay_later_due_days,
            pay_later_min_rating: jobs.pay_later_min_rating,
        }
    }
}

// --- Requests ---

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub bulk_order_window_id: Option<Uuid>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWindowRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub window_duration_hours: i64,
}

// --- Responses ---

#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub order_id: Uuid,
    pub amount_paid: Decimal,
    pub remaining_balance: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PendingPayment {
    pub order_id: Uuid,
    pub product_name: String,
    pub seller_name: String,
    pub total_amount: Decimal,
    pub due_date: Option<DateTime<Utc>>,
    pub days_remaining: i64,
}

#[derive(Debug, Serialize)]
pub struct WindowDetail {
    #[serde(flatten)]
    pub window: BulkOrderWindow,
    pub creator_name: Option<String>,
    pub orders: Vec<OrderWithDetails>,
}

pub struct OrderService {
    db: Arc<Database>,
    policy: OrderPolicy,
}

impl OrderService {
    pub fn new(db: Arc<Database>, policy: OrderPolicy) -> Self {
        Self { db, policy }
    }

    /// Create a new order (buy now, buy now pay later, or join bulk window)
    pub async fn create_order(
        &self,
        auth_user_id: Uuid,
        req: CreateOrderRequest,
    ) -> Result<Order, OrderError> {
        if req.quantity <= 0 {
            return Err(OrderError::InvalidQuantity);
        }

        let pool = self.db.pool();
        let buyer = UserProfileRepository::get_by_user_id(pool, auth_user_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;
        let vendor = VendorRepository::get_by_user_profile(pool, buyer.id)
            .await?
            .ok_or(OrderError::NotAVendor)?;
        if !vendor.is_active {
            return Err(OrderError::AccountSuspended);
        }

        let product = ProductRepository::get_by_id(pool, req.product_id)
            .await?
            .ok_or(OrderError::ProductNotFound(req.product_id))?;
        if !product.is_active {
            return Err(OrderError::ProductInactive);
        }
        if req.quantity < product.minimum_order_quantity {
            return Err(OrderError::BelowMinimumQuantity(
                product.minimum_order_quantity,
                product.unit.clone(),
            ));
        }

        let tiers = ProductRepository::pricing_tiers(pool, product.id).await?;
        let price_per_unit = price_for_quantity(&tiers, req.quantity).ok_or(OrderError::NoPricing)?;
        let total_amount = price_per_unit * Decimal::from(req.quantity);

        // Orders record the seller as the supplier's user profile
        let seller_id = SupplierRepository::user_profile_id(pool, product.supplier_profile_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;

        let mut new = NewOrder {
            buyer_id: buyer.id,
            seller_id,
            product_id: product.id,
            quantity: req.quantity,
            price_per_unit,
            total_amount,
            order_type: req.order_type,
            payment_status: PaymentStatus::Pending,
            due_date: None,
            bulk_order_window_id: None,
            delivery_address: req.delivery_address,
            notes: req.notes,
        };

        // Joining a window overrides the requested order type; payment is
        // handled when the window closes
        if let Some(window_id) = req.bulk_order_window_id {
            let window = WindowRepository::get_by_id(pool, window_id)
                .await?
                .ok_or(OrderError::WindowNotFound)?;
            if window.status != WindowStatus::Open {
                return Err(OrderError::WindowClosed);
            }
            if window.is_expired(Utc::now()) {
                return Err(OrderError::WindowExpired);
            }
            new.order_type = OrderType::BulkOrder;
            new.bulk_order_window_id = Some(window.id);
            return Ok(OrderRepository::insert(pool, &new).await?);
        }

        match req.order_type {
            OrderType::BuyNowPayLater => {
                if !vendor.can_pay_later(self.policy.pay_later_min_rating) {
                    return Err(OrderError::PayLaterNotEligible(
                        self.policy.pay_later_min_rating,
                    ));
                }
                new.due_date = Some(Utc::now() + Duration::days(self.policy.pay_later_due_days));
                Ok(OrderRepository::insert(pool, &new).await?)
            }
            // A bulk order must name its window
            OrderType::BulkOrder => Err(OrderError::WindowNotFound),
            OrderType::BuyNow => self.settle_buy_now(vendor.id, new).await,
        }
    }

    /// Immediate checkout: debit and create the order atomically
    async fn settle_buy_now(&self, vendor_id: Uuid, mut new: NewOrder) -> Result<Order, OrderError> {
        let mut tx = self.db.pool().begin().await?;

        // Lock and check balance with SELECT FOR UPDATE
        let row = sqlx::query("SELECT balance FROM vendor_profiles WHERE id = $1 FOR UPDATE")
            .bind(vendor_id)
            .fetch_one(&mut *tx)
            .await?;
        let available: Decimal = row.get("balance");

        if available < new.total_amount {
            return Err(OrderError::InsufficientBalance {
                required: new.total_amount,
                available,
            });
        }

        sqlx::query(
            "UPDATE vendor_profiles SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
             WHERE id = $2",
        )
        .bind(new.total_amount)
        .bind(vendor_id)
        .execute(&mut *tx)
        .await?;

        new.payment_status = PaymentStatus::Paid;
        let order = OrderRepository::insert(&mut *tx, &new).await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Pay for a pending order (buy now, pay later)
    pub async fn pay_pending_order(
        &self,
        auth_user_id: Uuid,
        order_id: Uuid,
    ) -> Result<PaymentReceipt, OrderError> {
        let pool = self.db.pool();
        let profile = UserProfileRepository::get_by_user_id(pool, auth_user_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;
        let vendor = VendorRepository::get_by_user_profile(pool, profile.id)
            .await?
            .ok_or(OrderError::NotAVendor)?;

        let mut tx = pool.begin().await?;

        // Lock the order row so the finalization sweep cannot settle it
        // concurrently
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1 AND buyer_id = $2 FOR UPDATE")
            .bind(order_id)
            .bind(profile.id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        let order = repository::map_order(&row)?;

        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::NotPending);
        }
        if order.order_type != OrderType::BuyNowPayLater {
            return Err(OrderError::NotPayLater);
        }
        if order.is_overdue(Utc::now()) {
            return Err(OrderError::PaymentOverdue);
        }

        let brow = sqlx::query("SELECT balance FROM vendor_profiles WHERE id = $1 FOR UPDATE")
            .bind(vendor.id)
            .fetch_one(&mut *tx)
            .await?;
        let available: Decimal = brow.get("balance");

        if available < order.total_amount {
            return Err(OrderError::InsufficientBalance {
                required: order.total_amount,
                available,
            });
        }

        let remaining: Decimal = sqlx::query_scalar(
            "UPDATE vendor_profiles SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP
             WHERE id = $2
             RETURNING balance",
        )
        .bind(order.total_amount)
        .bind(vendor.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE orders SET payment_status = 'paid', updated_at = CURRENT_TIMESTAMP
             WHERE id = $1",
        )
        .bind(order.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PaymentReceipt {
            order_id: order.id,
            amount_paid: order.total_amount,
            remaining_balance: remaining,
        })
    }

    /// Get vendor's pending payment orders (buy now, pay later)
    pub async fn pending_payments(
        &self,
        auth_user_id: Uuid,
    ) -> Result<Vec<PendingPayment>, OrderError> {
        let pool = self.db.pool();
        let profile = UserProfileRepository::get_by_user_id(pool, auth_user_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;

        let orders = OrderRepository::pending_pay_later(pool, profile.id).await?;
        let now = Utc::now();

        Ok(orders
            .into_iter()
            .map(|o| {
                let days_remaining = o
                    .order
                    .due_date
                    .map(|due| (due - now).num_days().max(0))
                    .unwrap_or(0);
                PendingPayment {
                    order_id: o.order.id,
                    product_name: o
                        .product_name
                        .unwrap_or_else(|| "Unknown Product".to_string()),
                    seller_name: o
                        .seller_name
                        .unwrap_or_else(|| "Unknown Seller".to_string()),
                    total_amount: o.order.total_amount,
                    due_date: o.order.due_date,
                    days_remaining,
                }
            })
            .collect())
    }

    /// Current user's orders, newest first
    pub async fn my_orders(
        &self,
        auth_user_id: Uuid,
        order_type: Option<OrderType>,
        payment_status: Option<PaymentStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<OrderWithDetails>, i64), OrderError> {
        let pool = self.db.pool();
        let profile = UserProfileRepository::get_by_user_id(pool, auth_user_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;

        Ok(OrderRepository::list_by_buyer(pool, profile.id, order_type, payment_status, page, limit)
            .await?)
    }

    /// Open a new bulk order window
    pub async fn create_bulk_window(
        &self,
        auth_user_id: Uuid,
        req: CreateWindowRequest,
    ) -> Result<BulkOrderWindow, OrderError> {
        if req.window_duration_hours <= 0 {
            return Err(OrderError::InvalidWindowDuration);
        }

        let pool = self.db.pool();
        let profile = UserProfileRepository::get_by_user_id(pool, auth_user_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;
        let vendor = VendorRepository::get_by_user_profile(pool, profile.id)
            .await?
            .ok_or(OrderError::NotAVendor)?;
        if !vendor.is_active {
            return Err(OrderError::AccountSuspended);
        }

        let window_end_time = Utc::now() + Duration::hours(req.window_duration_hours);
        Ok(WindowRepository::create(
            pool,
            profile.id,
            &req.title,
            req.description.as_deref(),
            window_end_time,
        )
        .await?)
    }

    /// Open, unexpired bulk order windows
    pub async fn open_windows(
        &self,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<BulkOrderWindow>, i64), OrderError> {
        Ok(WindowRepository::list_open(self.db.pool(), page, limit).await?)
    }

    /// Bulk order window with its current orders
    pub async fn window_detail(&self, window_id: Uuid) -> Result<WindowDetail, OrderError> {
        let pool = self.db.pool();
        let window = WindowRepository::get_by_id(pool, window_id)
            .await?
            .ok_or(OrderError::WindowNotFound)?;
        let orders = WindowRepository::orders_in_window(pool, window.id).await?;
        let creator_name = UserProfileRepository::get_by_id(pool, window.creator_id)
            .await?
            .map(|p| p.shown_name().to_string());

        Ok(WindowDetail {
            window,
            creator_name,
            orders,
        })
    }

    /// Credit a vendor balance after the external payment gateway has
    /// cleared the top-up. Returns the new balance.
    pub async fn credit_balance(
        &self,
        auth_user_id: Uuid,
        amount: Decimal,
    ) -> Result<Decimal, OrderError> {
        if amount <= Decimal::ZERO {
            return Err(OrderError::InvalidAmount);
        }

        let pool = self.db.pool();
        let profile = UserProfileRepository::get_by_user_id(pool, auth_user_id)
            .await?
            .ok_or(OrderError::ProfileNotFound)?;
        let vendor = VendorRepository::get_by_user_profile(pool, profile.id)
            .await?
            .ok_or(OrderError::NotAVendor)?;

        VendorRepository::credit_balance(pool, vendor.id, amount)
            .await?
            .ok_or(OrderError::NotAVendor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_jobs_config() {
        let jobs = JobsConfig {
            pay_later_due_days: 7,
            pay_later_min_rating: 4.0,
            ..JobsConfig::default()
        };
        let policy = OrderPolicy::from(&jobs);
        assert_eq!(policy.pay_later_due_days, 7);
        assert_eq!(policy.pay_later_min_rating, 4.0);
    }

    #[test]
    fn test_policy_defaults() {
        let policy = OrderPolicy::default();
        assert_eq!(policy.pay_later_due_days, 5);
        assert_eq!(policy.pay_later_min_rating, 4.5);
    }
}
