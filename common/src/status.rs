use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::shipment::ShipmentId;

/// Where a shipment is in its journey. Any code may follow any other; there is
/// no transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Received,
    InSorting,
    LocalShipping,
    Departed,
    AtBorder,
    InTransit,
    ArrivedCity,
    Delayed,
    ReadyPickup,
    Returned,
}

impl StatusCode {
    pub fn all() -> &'static [StatusCode] {
        &[
            StatusCode::Received,
            StatusCode::InSorting,
            StatusCode::LocalShipping,
            StatusCode::Departed,
            StatusCode::AtBorder,
            StatusCode::InTransit,
            StatusCode::ArrivedCity,
            StatusCode::Delayed,
            StatusCode::ReadyPickup,
            StatusCode::Returned,
        ]
    }

    /// Stored and wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCode::Received => "received",
            StatusCode::InSorting => "in_sorting",
            StatusCode::LocalShipping => "local_shipping",
            StatusCode::Departed => "departed",
            StatusCode::AtBorder => "at_border",
            StatusCode::InTransit => "in_transit",
            StatusCode::ArrivedCity => "arrived_city",
            StatusCode::Delayed => "delayed",
            StatusCode::ReadyPickup => "ready_pickup",
            StatusCode::Returned => "returned",
        }
    }

    /// Human-readable label for reports and the tracking page.
    pub fn label(self) -> &'static str {
        match self {
            StatusCode::Received => "Received at center",
            StatusCode::InSorting => "In sorting",
            StatusCode::LocalShipping => "Local shipping",
            StatusCode::Departed => "Departed",
            StatusCode::AtBorder => "At the border crossing",
            StatusCode::InTransit => "In transit",
            StatusCode::ArrivedCity => "Arrived in city",
            StatusCode::Delayed => "Delayed",
            StatusCode::ReadyPickup => "Ready for pickup",
            StatusCode::Returned => "Returned",
        }
    }

    /// Shipments in this state count as delivered on the dashboard.
    pub fn is_delivered(self) -> bool {
        self == StatusCode::ReadyPickup
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status code '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for StatusCode {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatusCode::all()
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A status transition before it is attached to a shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: StatusCode,
    pub city: String,
    pub notes: String,
    pub date: NaiveDate,
    #[serde(with = "crate::timefmt::hh_mm")]
    pub time: NaiveTime,
}

impl StatusChange {
    pub fn for_shipment(self, shipment_id: ShipmentId) -> StatusEvent {
        StatusEvent {
            shipment_id,
            status: self.status,
            city: self.city,
            notes: self.notes,
            date: self.date,
            time: self.time,
        }
    }
}

/// One entry of a shipment's status history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub shipment_id: ShipmentId,
    pub status: StatusCode,
    pub city: String,
    pub notes: String,
    pub date: NaiveDate,
    #[serde(with = "crate::timefmt::hh_mm")]
    pub time: NaiveTime,
}

/// Note attached to the event synthesized when a shipment is registered.
pub const RECEIVED_NOTE: &str = "Shipment received at the center";

/// Initial history entry as submitted with a new shipment. Everything is
/// optional; the status is always forced to `received`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusEntryInput {
    pub status: Option<StatusCode>,
    pub city: String,
    pub notes: String,
    #[serde(with = "crate::timefmt::ymd_opt")]
    pub date: Option<NaiveDate>,
    #[serde(with = "crate::timefmt::hh_mm_opt")]
    pub time: Option<NaiveTime>,
}

impl StatusEntryInput {
    /// Normalize into the `received` change that opens every history.
    /// Missing date, time or notes fall back to `now` and [`RECEIVED_NOTE`].
    pub fn into_received(self, now: NaiveDateTime) -> StatusChange {
        let notes = if self.notes.trim().is_empty() {
            RECEIVED_NOTE.to_string()
        } else {
            self.notes
        };
        StatusChange {
            status: StatusCode::Received,
            city: self.city,
            notes,
            date: self.date.unwrap_or_else(|| now.date()),
            time: self.time.unwrap_or_else(|| now.time()),
        }
    }
}

/// Append-only, insertion-ordered log of status events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusHistory(Vec<StatusEvent>);

impl StatusHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Build from events already in insertion order.
    pub fn from_events(events: Vec<StatusEvent>) -> Self {
        Self(events)
    }

    pub fn push(&mut self, event: StatusEvent) {
        self.0.push(event);
    }

    /// The most recent event; its status is the shipment's current status.
    pub fn latest(&self) -> Option<&StatusEvent> {
        self.0.last()
    }

    pub fn first(&self) -> Option<&StatusEvent> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatusEvent> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[StatusEvent] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a StatusHistory {
    type Item = &'a StatusEvent;
    type IntoIter = std::slice::Iter<'a, StatusEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
