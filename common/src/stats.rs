use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::shipment::Shipment;

/// Dashboard counters over a set of shipments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentStats {
    pub total: usize,
    /// Shipments whose current status counts as delivered.
    pub delivered: usize,
    pub pending: usize,
    /// Sum of final prices, per billing currency.
    pub revenue: BTreeMap<Currency, Decimal>,
}

impl ShipmentStats {
    pub fn from_shipments<'a>(shipments: impl IntoIterator<Item = &'a Shipment>) -> Self {
        let mut stats = ShipmentStats::default();
        for shipment in shipments {
            stats.total += 1;
            if shipment.status.is_delivered() {
                stats.delivered += 1;
            }
            *stats
                .revenue
                .entry(shipment.details.currency)
                .or_insert(Decimal::ZERO) += shipment.final_price;
        }
        stats.pending = stats.total - stats.delivered;
        stats
    }
}
