//! Data models for marketplace profiles

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Minimal view of a user profile (owned by the auth domain)
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: Uuid,
    /// Auth provider user id
    pub user_id: Uuid,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub display_name: Option<String>,
    pub role: String,
}

impl UserProfile {
    /// Name shown on orders and windows, falling back like the web UI does
    pub fn shown_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.first_name.as_deref())
            .or(self.username.as_deref())
            .unwrap_or("Unknown")
    }
}

/// Street-vendor profile: the buyer side of the marketplace
#[derive(Debug, Clone)]
pub struct VendorProfile {
    pub id: Uuid,
    pub user_profile_id: Uuid,
    pub is_active: bool,
    pub is_verified: bool,
    pub average_rating: f64,
    pub total_reviews: i32,
    /// Mutated only by settlement paths: buy-now debit, pay-later debit,
    /// finalization debit, top-up credit
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VendorProfile {
    pub fn can_pay_later(&self, min_rating: f64) -> bool {
        self.average_rating >= min_rating
    }
}
