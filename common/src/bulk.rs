use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::shipment::ShipmentId;
use crate::status::{StatusChange, StatusCode};

/// One status transition applied to a selection of shipments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusUpdate {
    pub selected_ids: Vec<ShipmentId>,
    pub new_status: StatusCode,
    #[serde(default)]
    pub current_city: String,
    #[serde(default)]
    pub status_notes: String,
    #[serde(default, with = "crate::timefmt::ymd_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default, with = "crate::timefmt::hh_mm_opt")]
    pub time: Option<NaiveTime>,
}

impl BulkStatusUpdate {
    /// Selected ids with duplicates removed, first occurrence wins.
    pub fn unique_ids(&self) -> Vec<ShipmentId> {
        let mut seen = Vec::with_capacity(self.selected_ids.len());
        for id in &self.selected_ids {
            if !seen.contains(id) {
                seen.push(*id);
            }
        }
        seen
    }

    /// The event body to append; missing date or time default to `now`.
    pub fn change(&self, now: NaiveDateTime) -> StatusChange {
        StatusChange {
            status: self.new_status,
            city: self.current_city.clone(),
            notes: self.status_notes.clone(),
            date: self.date.unwrap_or_else(|| now.date()),
            time: self.time.unwrap_or_else(|| now.time()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkOutcome {
    Updated,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkItem {
    pub id: ShipmentId,
    pub outcome: BulkOutcome,
}

/// Per-id result of a bulk status update. Missing ids are skipped, not fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusReport {
    pub items: Vec<BulkItem>,
}

impl BulkStatusReport {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = (ShipmentId, bool)>) -> Self {
        let items = outcomes
            .into_iter()
            .map(|(id, updated)| BulkItem {
                id,
                outcome: if updated {
                    BulkOutcome::Updated
                } else {
                    BulkOutcome::NotFound
                },
            })
            .collect();
        Self { items }
    }

    pub fn updated_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.outcome == BulkOutcome::Updated)
            .count()
    }

    pub fn not_found(&self) -> impl Iterator<Item = ShipmentId> + '_ {
        self.items
            .iter()
            .filter(|item| item.outcome == BulkOutcome::NotFound)
            .map(|item| item.id)
    }
}
