//! Order and bulk-window data models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How the order is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Balance debited at checkout
    #[default]
    BuyNow,
    /// Payment deferred; due_date set, settled manually or by suspension
    BuyNowPayLater,
    /// Joined a bulk window; settled at finalization
    BulkOrder,
}

impl OrderType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderType::BuyNow => "buy_now",
            OrderType::BuyNowPayLater => "buy_now_pay_later",
            OrderType::BulkOrder => "bulk_order",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buy_now" => Ok(OrderType::BuyNow),
            "buy_now_pay_later" => Ok(OrderType::BuyNowPayLater),
            "bulk_order" => Ok(OrderType::BulkOrder),
            _ => Err(format!("Invalid order type: {}", s)),
        }
    }
}

/// Payment lifecycle. Transitions pending -> paid | failed, never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }

    /// Settled orders never go back to pending
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// Bulk window lifecycle. open -> finalized, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    #[default]
    Open,
    Finalized,
}

impl WindowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            WindowStatus::Open => "open",
            WindowStatus::Finalized => "finalized",
        }
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(WindowStatus::Open),
            "finalized" => Ok(WindowStatus::Finalized),
            _ => Err(format!("Invalid window status: {}", s)),
        }
    }
}

/// A vendor's purchase from a supplier
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: Uuid,
    /// user_profiles id of the buying vendor
    pub buyer_id: Uuid,
    /// user_profiles id of the selling supplier
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub price_per_unit: Decimal,
    pub total_amount: Decimal,
    pub order_type: OrderType,
    pub payment_status: PaymentStatus,
    /// Set only for pay-later orders
    pub due_date: Option<DateTime<Utc>>,
    pub bulk_order_window_id: Option<Uuid>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        matches!(self.payment_status, PaymentStatus::Pending)
            && self.due_date.is_some_and(|due| now > due)
    }
}

/// A time-bounded batch in which vendors' orders aggregate before settlement
#[derive(Debug, Clone, Serialize)]
pub struct BulkOrderWindow {
    pub id: Uuid,
    /// user_profiles id of the vendor who opened the window
    pub creator_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub window_start_time: DateTime<Utc>,
    pub window_end_time: DateTime<Utc>,
    pub status: WindowStatus,
    /// Frozen at finalization: count of distinct buyers
    pub total_participants: i32,
    /// Frozen at finalization: sum of order totals
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BulkOrderWindow {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.window_end_time
    }

    pub fn accepts_orders(&self, now: DateTime<Utc>) -> bool {
        self.status == WindowStatus::Open && !self.is_expired(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_order_type_round_trip() {
        for t in [
            OrderType::BuyNow,
            OrderType::BuyNowPayLater,
            OrderType::BulkOrder,
        ] {
            assert_eq!(t.as_str().parse::<OrderType>().unwrap(), t);
        }
        assert!("cod".parse::<OrderType>().is_err());
    }

    #[test]
    fn test_payment_status_terminal() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Paid.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
        assert!("refunded".parse::<PaymentStatus>().is_err());
    }

    #[test]
    fn test_window_accepts_orders() {
        let now = Utc::now();
        let mut window = BulkOrderWindow {
            id: Uuid::new_v4(),
            creator_id: Uuid::new_v4(),
            title: "Monday veggies".to_string(),
            description: None,
            window_start_time: now - Duration::hours(1),
            window_end_time: now + Duration::hours(1),
            status: WindowStatus::Open,
            total_participants: 0,
            total_amount: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        assert!(window.accepts_orders(now));

        window.window_end_time = now - Duration::minutes(5);
        assert!(window.is_expired(now));
        assert!(!window.accepts_orders(now));

        window.window_end_time = now + Duration::hours(1);
        window.status = WindowStatus::Finalized;
        assert!(!window.accepts_orders(now));
    }

    #[test]
    fn test_order_overdue() {
        let now = Utc::now();
        let mut order = Order {
            id: Uuid::new_v4(),
            buyer_id: Uuid::new_v4(),
            seller_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 5,
            price_per_unit: Decimal::from(10),
            total_amount: Decimal::from(50),
            order_type: OrderType::BuyNowPayLater,
            payment_status: PaymentStatus::Pending,
            due_date: Some(now - Duration::days(1)),
            bulk_order_window_id: None,
            delivery_address: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        assert!(order.is_overdue(now));

        order.due_date = Some(now + Duration::days(1));
        assert!(!order.is_overdue(now));

        // Paid orders are never overdue
        order.due_date = Some(now - Duration::days(1));
        order.payment_status = PaymentStatus::Paid;
        assert!(!order.is_overdue(now));
    }
}
