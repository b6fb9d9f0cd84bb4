//! Bulk pricing tier selection

use super::models::BulkPricingTier;
use rust_decimal::Decimal;

/// Pick the unit price for a quantity from a product's pricing tiers.
///
/// Tiers are matched on their [min_quantity, max_quantity] band; an open
/// max_quantity means the band is unbounded. A quantity below the lowest
/// band falls back to the first tier. Returns None when the product has
/// no tiers at all.
pub fn price_for_quantity(tiers: &[BulkPricingTier], quantity: i32) -> Option<Decimal> {
    if tiers.is_empty() {
        return None;
    }

    let mut sorted: Vec<&BulkPricingTier> = tiers.iter().collect();
    sorted.sort_by_key(|t| t.min_quantity);

    let mut applicable = None;
    for tier in &sorted {
        if quantity < tier.min_quantity {
            break;
        }
        match tier.max_quantity {
            Some(max) if quantity > max => continue,
            _ => applicable = Some(*tier),
        }
    }

    // Below the lowest band: charge the first tier
    let tier = applicable.unwrap_or(sorted[0]);
    Some(tier.price_per_unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn tier(min: i32, max: Option<i32>, price: i64) -> BulkPricingTier {
        BulkPricingTier {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            min_quantity: min,
            max_quantity: max,
            price_per_unit: Decimal::from(price),
        }
    }

    fn three_bands() -> Vec<BulkPricingTier> {
        // Deliberately unsorted: selection must sort by min_quantity
        vec![
            tier(51, None, 4),
            tier(1, Some(10), 6),
            tier(11, Some(50), 5),
        ]
    }

    #[test]
    fn test_no_tiers() {
        assert_eq!(price_for_quantity(&[], 10), None);
    }

    #[test]
    fn test_band_selection() {
        let tiers = three_bands();
        assert_eq!(price_for_quantity(&tiers, 1), Some(Decimal::from(6)));
        assert_eq!(price_for_quantity(&tiers, 10), Some(Decimal::from(6)));
        assert_eq!(price_for_quantity(&tiers, 11), Some(Decimal::from(5)));
        assert_eq!(price_for_quantity(&tiers, 50), Some(Decimal::from(5)));
        assert_eq!(price_for_quantity(&tiers, 51), Some(Decimal::from(4)));
        assert_eq!(price_for_quantity(&tiers, 5000), Some(Decimal::from(4)));
    }

    #[test]
    fn test_below_lowest_band_uses_first_tier() {
        let tiers = vec![tier(10, Some(99), 5), tier(100, None, 4)];
        assert_eq!(price_for_quantity(&tiers, 3), Some(Decimal::from(5)));
    }

    #[test]
    fn test_gap_between_bands_falls_back() {
        // 1-10 then 20+; quantity 15 sits in the gap
        let tiers = vec![tier(1, Some(10), 6), tier(20, None, 4)];
        assert_eq!(price_for_quantity(&tiers, 15), Some(Decimal::from(6)));
    }
}
