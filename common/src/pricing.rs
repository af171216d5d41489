//! Weight-based billing with a minimum billable weight.
//!
//! All arithmetic is exact (`Decimal`); rounding only happens when an amount
//! is formatted for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Anything lighter than this is billed as if it weighed this much (kg).
pub const MIN_BILLABLE_WEIGHT: Decimal = Decimal::TEN;

/// Decimal places shown for money amounts.
pub const DISPLAY_SCALE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    pub base_price: Decimal,
    pub final_price: Decimal,
}

/// Weight used for billing: the actual weight, floored at [`MIN_BILLABLE_WEIGHT`].
pub fn billable_weight(weight: Decimal) -> Decimal {
    weight.max(MIN_BILLABLE_WEIGHT)
}

/// `base = max(weight, 10) * unit_price`, `final = base + insurance + packaging`.
pub fn compute_price(
    weight: Decimal,
    unit_price: Decimal,
    insurance_cost: Decimal,
    packaging_cost: Decimal,
) -> Price {
    let base_price = billable_weight(weight) * unit_price;
    Price {
        base_price,
        final_price: base_price + insurance_cost + packaging_cost,
    }
}

/// Format an amount with exactly two decimals, e.g. `158.00`.
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = amount.round_dp(DISPLAY_SCALE);
    rounded.rescale(DISPLAY_SCALE);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_light_parcels_bill_the_minimum_weight() {
        for w in ["0", "0.5", "5", "9.99", "10"] {
            let price = compute_price(d(w), d("20"), Decimal::ZERO, Decimal::ZERO);
            assert_eq!(price.base_price, d("200"), "weight {w}");
        }
    }

    #[test]
    fn test_heavy_parcels_bill_actual_weight() {
        let price = compute_price(d("15"), d("10"), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(price.base_price, d("150"));
        let price = compute_price(d("10.25"), d("4"), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(price.base_price, d("41"));
    }

    #[test]
    fn test_small_parcel_without_addons() {
        let price = compute_price(d("5"), d("20"), Decimal::ZERO, Decimal::ZERO);
        assert_eq!(format_money(price.base_price), "200.00");
        assert_eq!(format_money(price.final_price), "200.00");
    }

    #[test]
    fn test_addons_are_added_to_base() {
        let price = compute_price(d("15"), d("10"), d("5"), d("3"));
        assert_eq!(format_money(price.base_price), "150.00");
        assert_eq!(format_money(price.final_price), "158.00");
    }

    #[test]
    fn test_final_price_is_exact_and_survives_json() {
        // 0.1 + 0.2 style amounts must not drift.
        let price = compute_price(d("12.3"), d("0.1"), d("0.2"), d("0.7"));
        assert_eq!(price.base_price, d("1.23"));
        assert_eq!(price.final_price, d("2.13"));

        let mut json = serde_json::to_string(&price).unwrap();
        for _ in 0..5 {
            let back: Price = serde_json::from_str(&json).unwrap();
            assert_eq!(back, price);
            json = serde_json::to_string(&back).unwrap();
        }
    }

    #[test]
    fn test_format_money_rounds_half_to_even() {
        assert_eq!(format_money(d("1.005")), "1.00");
        assert_eq!(format_money(d("1.015")), "1.02");
        assert_eq!(format_money(d("7")), "7.00");
        assert_eq!(format_money(d("3.14159")), "3.14");
    }
}
