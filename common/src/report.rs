//! Flat rows handed to spreadsheet and print formatters.
//!
//! Formatters live outside this workspace; they only ever see these rows, with
//! every amount already rendered to two decimals.

use serde::{Deserialize, Serialize};

use crate::pricing::format_money;
use crate::shipment::Shipment;

/// Column titles, in the same order as [`ReportRow::cells`].
pub const HEADERS: [&str; 21] = [
    "Shipment number",
    "Tracking code",
    "Sender",
    "Sender phone",
    "Sender country",
    "Sender city",
    "Receiver",
    "Receiver phone",
    "Receiver country",
    "Receiver city",
    "Quantity",
    "Weight (kg)",
    "Item type",
    "Contents",
    "Base price",
    "Insurance cost",
    "Packaging cost",
    "Final price",
    "Currency",
    "Payment method",
    "Status",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub shipment_number: String,
    pub invoice_number: String,
    pub tracking_code: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_country: String,
    pub sender_city: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_country: String,
    pub receiver_city: String,
    pub quantity: String,
    pub weight: String,
    pub unit_price: String,
    pub item_type: String,
    pub contents: String,
    pub base_price: String,
    pub insurance_cost: String,
    pub packaging_cost: String,
    pub final_price: String,
    pub currency: String,
    pub payment_method: String,
    pub status: String,
}

impl ReportRow {
    pub fn from_shipment(shipment: &Shipment) -> Self {
        let d = &shipment.details;
        Self {
            shipment_number: d.shipment_number.clone(),
            invoice_number: d.invoice_number.clone(),
            tracking_code: shipment.tracking_code.to_string(),
            sender_name: shipment.sender.name.clone(),
            sender_phone: shipment.sender.phone.clone(),
            sender_country: shipment.sender.country.clone(),
            sender_city: shipment.sender.city.clone(),
            receiver_name: shipment.receiver.name.clone(),
            receiver_phone: shipment.receiver.phone.clone(),
            receiver_country: shipment.receiver.country.clone(),
            receiver_city: shipment.receiver.city.clone(),
            quantity: d.quantity.to_string(),
            weight: d.weight.normalize().to_string(),
            unit_price: format_money(d.unit_price),
            item_type: d.item_type.clone(),
            contents: d.contents.clone(),
            base_price: format_money(shipment.base_price()),
            insurance_cost: format_money(d.insurance_cost),
            packaging_cost: format_money(d.packaging_cost),
            final_price: format_money(shipment.final_price),
            currency: d.currency.code().to_string(),
            payment_method: d.payment_method.label().to_string(),
            status: shipment.status.as_str().to_string(),
        }
    }

    /// Values for the spreadsheet columns named in [`HEADERS`].
    pub fn cells(&self) -> [&str; 21] {
        [
            self.shipment_number.as_str(),
            self.tracking_code.as_str(),
            self.sender_name.as_str(),
            self.sender_phone.as_str(),
            self.sender_country.as_str(),
            self.sender_city.as_str(),
            self.receiver_name.as_str(),
            self.receiver_phone.as_str(),
            self.receiver_country.as_str(),
            self.receiver_city.as_str(),
            self.quantity.as_str(),
            self.weight.as_str(),
            self.item_type.as_str(),
            self.contents.as_str(),
            self.base_price.as_str(),
            self.insurance_cost.as_str(),
            self.packaging_cost.as_str(),
            self.final_price.as_str(),
            self.currency.as_str(),
            self.payment_method.as_str(),
            self.status.as_str(),
        ]
    }
}

pub fn report_rows(shipments: &[Shipment]) -> Vec<ReportRow> {
    shipments.iter().map(ReportRow::from_shipment).collect()
}
