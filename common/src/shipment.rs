use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::contact::{Contact, ContactId, ContactInput};
use crate::currency::Currency;
use crate::pricing::{self, Price};
use crate::status::{StatusChange, StatusCode, StatusEntryInput, StatusEvent, StatusHistory};
use crate::tracking::TrackingCode;

/// Internal numeric shipment id (row id of the `shipments` table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(pub i64);

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingType {
    #[default]
    Local,
    International,
}

impl ShippingType {
    pub fn as_str(self) -> &'static str {
        match self {
            ShippingType::Local => "local",
            ShippingType::International => "international",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Sender pays at the counter.
    #[default]
    Prepaid,
    /// Receiver pays on delivery.
    Cod,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Prepaid => "prepaid",
            PaymentMethod::Cod => "cod",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PaymentMethod::Prepaid => "Prepaid",
            PaymentMethod::Cod => "Cash on delivery",
        }
    }
}

/// A stored enum column held a value this build does not know.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for ShippingType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(ShippingType::Local),
            "international" => Ok(ShippingType::International),
            other => Err(UnknownVariant {
                kind: "shipping type",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepaid" => Ok(PaymentMethod::Prepaid),
            "cod" => Ok(PaymentMethod::Cod),
            other => Err(UnknownVariant {
                kind: "payment method",
                value: other.to_string(),
            }),
        }
    }
}

/// The staff-editable columns of a shipment. Shared by input, stored row and
/// aggregate so the three can never drift apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentDetails {
    #[serde(default)]
    pub shipment_number: String,
    #[serde(default)]
    pub invoice_number: String,
    pub date: NaiveDate,
    #[serde(with = "crate::timefmt::hh_mm")]
    pub time: NaiveTime,
    #[serde(default)]
    pub branch: String,
    pub shipping_type: ShippingType,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub insurance: bool,
    #[serde(default)]
    pub insurance_cost: Decimal,
    #[serde(default)]
    pub packaging: bool,
    #[serde(default)]
    pub packaging_cost: Decimal,
    #[serde(deserialize_with = "count::deserialize")]
    pub quantity: u32,
    pub unit_price: Decimal,
    pub weight: Decimal,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub contents: String,
    pub currency: Currency,
}

impl ShipmentDetails {
    pub fn price(&self) -> Price {
        pricing::compute_price(
            self.weight,
            self.unit_price,
            self.insurance_cost,
            self.packaging_cost,
        )
    }
}

/// Create/update payload. Server-assigned fields (`id`, `trackingCode`,
/// `status`, `finalPrice`) are ignored if a client sends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentInput {
    #[serde(flatten)]
    pub details: ShipmentDetails,
    #[serde(default)]
    pub sender: ContactInput,
    #[serde(default)]
    pub receiver: ContactInput,
    /// Only the first entry is used, and only on create.
    #[serde(default)]
    pub status_history: Vec<StatusEntryInput>,
}

/// The shipment aggregate: shipment row, both contacts and the full status
/// history, read and written as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: ShipmentId,
    #[serde(flatten)]
    pub details: ShipmentDetails,
    pub sender: Contact,
    pub receiver: Contact,
    pub final_price: Decimal,
    pub status: StatusCode,
    pub tracking_code: TrackingCode,
    pub status_history: StatusHistory,
}

impl Shipment {
    /// Base price is never stored; it is derived from weight and unit price.
    pub fn base_price(&self) -> Decimal {
        self.details.price().base_price
    }

    /// The editable part of this aggregate, as a client would resubmit it.
    pub fn to_input(&self) -> ShipmentInput {
        ShipmentInput {
            details: self.details.clone(),
            sender: self.sender.to_input(),
            receiver: self.receiver.to_input(),
            status_history: Vec::new(),
        }
    }

    /// Whether `query` (already lower-cased) occurs in the shipment number,
    /// invoice number or tracking code.
    pub fn matches_query(&self, lowered_query: &str) -> bool {
        [
            self.details.shipment_number.as_str(),
            self.details.invoice_number.as_str(),
            self.tracking_code.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(lowered_query))
    }

    /// Customer-facing view for the public tracking page.
    pub fn tracking_info(&self) -> TrackingInfo {
        TrackingInfo {
            tracking_code: self.tracking_code.clone(),
            shipment_number: self.details.shipment_number.clone(),
            status: self.status,
            status_label: self.status.label().to_string(),
            sender_country: self.sender.country.clone(),
            sender_city: self.sender.city.clone(),
            receiver_country: self.receiver.country.clone(),
            receiver_city: self.receiver.city.clone(),
            status_history: self
                .status_history
                .iter()
                .map(|e| StatusChange {
                    status: e.status,
                    city: e.city.clone(),
                    notes: e.notes.clone(),
                    date: e.date,
                    time: e.time,
                })
                .collect(),
        }
    }
}

/// What an anonymous customer sees for a tracking code: route and history,
/// no prices or phone numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingInfo {
    pub tracking_code: TrackingCode,
    pub shipment_number: String,
    pub status: StatusCode,
    pub status_label: String,
    pub sender_country: String,
    pub sender_city: String,
    pub receiver_country: String,
    pub receiver_city: String,
    pub status_history: Vec<StatusChange>,
}

/// A `shipments` table row: details plus foreign keys and server-owned columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRow {
    pub id: ShipmentId,
    pub details: ShipmentDetails,
    pub sender_id: ContactId,
    pub receiver_id: ContactId,
    pub final_price: Decimal,
    pub status: StatusCode,
    pub tracking_code: TrackingCode,
}

/// Everything a store reads for one shipment, before assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRecord {
    pub row: ShipmentRow,
    pub sender: Contact,
    pub receiver: Contact,
    /// In insertion order.
    pub events: Vec<StatusEvent>,
}

/// Everything a store writes to create one aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShipment {
    pub details: ShipmentDetails,
    pub sender: ContactInput,
    pub receiver: ContactInput,
    pub final_price: Decimal,
    pub tracking_code: TrackingCode,
    pub initial_status: StatusChange,
}

/// Everything a store overwrites on update. Status, tracking code and
/// history are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentUpdate {
    pub details: ShipmentDetails,
    pub sender: ContactInput,
    pub receiver: ContactInput,
    pub final_price: Decimal,
}

/// Stored rows that do not form a valid aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("shipment {shipment}: {role} contact {found:?} does not match row reference {expected:?}")]
    ContactMismatch {
        shipment: ShipmentId,
        role: &'static str,
        expected: ContactId,
        found: ContactId,
    },
    #[error("shipment {0}: sender and receiver share one contact record")]
    SharedContact(ShipmentId),
    #[error("shipment {shipment}: status event belongs to shipment {owner}")]
    ForeignEvent {
        shipment: ShipmentId,
        owner: ShipmentId,
    },
    #[error("shipment {0}: status history is empty")]
    EmptyHistory(ShipmentId),
    #[error("shipment {shipment}: stored status {stored} but latest event is {latest}")]
    StatusMismatch {
        shipment: ShipmentId,
        stored: StatusCode,
        latest: StatusCode,
    },
}

/// Compose a shipment row, its two contacts and its ordered events into one
/// aggregate, checking the invariants that tie them together.
pub fn assemble(record: ShipmentRecord) -> Result<Shipment, AssemblyError> {
    let ShipmentRecord {
        row,
        sender,
        receiver,
        events,
    } = record;

    if sender.id != row.sender_id {
        return Err(AssemblyError::ContactMismatch {
            shipment: row.id,
            role: "sender",
            expected: row.sender_id,
            found: sender.id,
        });
    }
    if receiver.id != row.receiver_id {
        return Err(AssemblyError::ContactMismatch {
            shipment: row.id,
            role: "receiver",
            expected: row.receiver_id,
            found: receiver.id,
        });
    }
    if sender.id == receiver.id {
        return Err(AssemblyError::SharedContact(row.id));
    }
    if let Some(foreign) = events.iter().find(|e| e.shipment_id != row.id) {
        return Err(AssemblyError::ForeignEvent {
            shipment: row.id,
            owner: foreign.shipment_id,
        });
    }

    let history = StatusHistory::from_events(events);
    let latest = history
        .latest()
        .ok_or(AssemblyError::EmptyHistory(row.id))?
        .status;
    if latest != row.status {
        return Err(AssemblyError::StatusMismatch {
            shipment: row.id,
            stored: row.status,
            latest,
        });
    }

    Ok(Shipment {
        id: row.id,
        details: row.details,
        sender,
        receiver,
        final_price: row.final_price,
        status: row.status,
        tracking_code: row.tracking_code,
        status_history: history,
    })
}

/// serde adapter for counts the admin form posts as text (`"3"`) as often as numbers.
mod count {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|e| serde::de::Error::custom(format!("invalid quantity '{raw}': {e}"))),
        }
    }
}
