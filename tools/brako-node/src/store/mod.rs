//! Persistence backends for the three shipment tables.
//!
//! A store only moves rows. Every write method runs as one atomic unit in the
//! backend's native transaction mechanism; reads return raw
//! [`ShipmentRecord`]s that the repository assembles into aggregates.

use async_trait::async_trait;
use serde::Serialize;

use brako_common::shipment::{NewShipment, ShipmentId, ShipmentRecord, ShipmentUpdate};
use brako_common::status::StatusChange;
use brako_common::tracking::TrackingCode;

use crate::error::ShipmentResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Which shipments a multi-row read returns. Results are always newest first.
#[derive(Debug, Clone, Copy)]
pub enum Selection<'a> {
    All,
    /// Lower-cased substring of shipment number, invoice number or tracking code.
    Search(&'a str),
    Ids(&'a [ShipmentId]),
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCounts {
    pub contacts: u64,
    pub shipments: u64,
    pub status_updates: u64,
}

#[async_trait]
pub trait ShipmentStore: Send + Sync {
    /// Insert sender, receiver, shipment row and the initial status event.
    async fn insert(&self, shipment: NewShipment) -> ShipmentResult<ShipmentId>;

    async fn fetch(&self, id: ShipmentId) -> ShipmentResult<Option<ShipmentRecord>>;

    async fn fetch_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> ShipmentResult<Option<ShipmentRecord>>;

    async fn fetch_all(&self, selection: Selection<'_>) -> ShipmentResult<Vec<ShipmentRecord>>;

    async fn tracking_code_exists(&self, code: &TrackingCode) -> ShipmentResult<bool>;

    /// Overwrite the row's details and both contacts. Returns `false` if the
    /// shipment does not exist.
    async fn update(&self, id: ShipmentId, update: ShipmentUpdate) -> ShipmentResult<bool>;

    /// Remove the shipment, both contacts and all its status events. Returns
    /// `false` if the shipment does not exist.
    async fn delete(&self, id: ShipmentId) -> ShipmentResult<bool>;

    /// Set the status of each shipment and append one event to its history.
    /// Missing ids are skipped and reported as `false`.
    async fn append_status(
        &self,
        ids: &[ShipmentId],
        change: &StatusChange,
    ) -> ShipmentResult<Vec<(ShipmentId, bool)>>;

    async fn counts(&self) -> ShipmentResult<TableCounts>;
}
