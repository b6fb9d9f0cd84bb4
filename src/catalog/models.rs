use rust_decimal::Decimal;
use uuid::Uuid;

/// A wholesale product listed by a supplier
#[derive(Debug, Clone)]
pub struct Product {
    pub id: Uuid,
    pub supplier_profile_id: Uuid,
    pub name: String,
    /// kg, piece, liter, ...
    pub unit: String,
    pub minimum_order_quantity: i32,
    pub is_active: bool,
}

/// One quantity band of a product's bulk pricing
///
/// Example: 1-10 units at 5/unit, 11-50 at 4.5/unit, 51+ at 4/unit.
#[derive(Debug, Clone)]
pub struct BulkPricingTier {
    pub id: Uuid,
    pub product_id: Uuid,
    pub min_quantity: i32,
    /// None means unbounded
    pub max_quantity: Option<i32>,
    pub price_per_unit: Decimal,
}
