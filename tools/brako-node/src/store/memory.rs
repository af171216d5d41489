//! Process-local store for development and tests.
//!
//! Writes clone the tables, mutate the clone and swap it in only when the
//! whole operation succeeded, so a failed write leaves nothing behind.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use brako_common::contact::{Contact, ContactId, ContactInput};
use brako_common::shipment::{
    NewShipment, ShipmentId, ShipmentRecord, ShipmentRow, ShipmentUpdate,
};
use brako_common::status::{StatusChange, StatusEvent};
use brako_common::tracking::TrackingCode;

use super::{Selection, ShipmentStore, TableCounts};
use crate::error::{ShipmentError, ShipmentResult};

/// Contact records, keyed by id. Each one belongs to exactly one shipment.
#[derive(Debug, Clone, Default)]
struct ContactTable {
    rows: BTreeMap<ContactId, Contact>,
    next_id: i64,
}

impl ContactTable {
    fn insert(&mut self, input: ContactInput) -> ContactId {
        self.next_id += 1;
        let id = ContactId(self.next_id);
        self.rows.insert(id, Contact::from_input(id, input));
        id
    }

    fn replace(&mut self, id: ContactId, input: ContactInput) -> ShipmentResult<()> {
        let slot = self
            .rows
            .get_mut(&id)
            .ok_or_else(|| ShipmentError::Persistence(format!("dangling contact {}", id.0)))?;
        *slot = Contact::from_input(id, input);
        Ok(())
    }

    fn get(&self, id: ContactId) -> ShipmentResult<Contact> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or_else(|| ShipmentError::Persistence(format!("dangling contact {}", id.0)))
    }
}

/// Append-only status events, in insertion order.
#[derive(Debug, Clone, Default)]
struct StatusLog {
    events: Vec<StatusEvent>,
}

impl StatusLog {
    fn append(&mut self, event: StatusEvent) {
        self.events.push(event);
    }

    fn events_for(&self, id: ShipmentId) -> Vec<StatusEvent> {
        self.events
            .iter()
            .filter(|e| e.shipment_id == id)
            .cloned()
            .collect()
    }

    fn remove_for(&mut self, id: ShipmentId) {
        self.events.retain(|e| e.shipment_id != id);
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    contacts: ContactTable,
    shipments: BTreeMap<ShipmentId, ShipmentRow>,
    status_log: StatusLog,
    next_shipment_id: i64,
}

impl Tables {
    fn record(&self, row: &ShipmentRow) -> ShipmentResult<ShipmentRecord> {
        Ok(ShipmentRecord {
            row: row.clone(),
            sender: self.contacts.get(row.sender_id)?,
            receiver: self.contacts.get(row.receiver_id)?,
            events: self.status_log.events_for(row.id),
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `op` against a staged copy and commit it only on success.
    async fn write<T>(
        &self,
        op: impl FnOnce(&mut Tables) -> ShipmentResult<T> + Send,
    ) -> ShipmentResult<T> {
        let mut tables = self.tables.lock().await;
        let mut staged = tables.clone();
        let out = op(&mut staged)?;
        *tables = staged;
        Ok(out)
    }
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn insert(&self, shipment: NewShipment) -> ShipmentResult<ShipmentId> {
        self.write(move |t| {
            if t.shipments
                .values()
                .any(|row| row.tracking_code == shipment.tracking_code)
            {
                return Err(ShipmentError::Persistence(format!(
                    "tracking code {} already in use",
                    shipment.tracking_code
                )));
            }
            let sender_id = t.contacts.insert(shipment.sender);
            let receiver_id = t.contacts.insert(shipment.receiver);

            t.next_shipment_id += 1;
            let id = ShipmentId(t.next_shipment_id);
            t.shipments.insert(
                id,
                ShipmentRow {
                    id,
                    details: shipment.details,
                    sender_id,
                    receiver_id,
                    final_price: shipment.final_price,
                    status: shipment.initial_status.status,
                    tracking_code: shipment.tracking_code,
                },
            );
            t.status_log
                .append(shipment.initial_status.for_shipment(id));
            Ok(id)
        })
        .await
    }

    async fn fetch(&self, id: ShipmentId) -> ShipmentResult<Option<ShipmentRecord>> {
        let tables = self.tables.lock().await;
        tables
            .shipments
            .get(&id)
            .map(|row| tables.record(row))
            .transpose()
    }

    async fn fetch_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> ShipmentResult<Option<ShipmentRecord>> {
        let tables = self.tables.lock().await;
        tables
            .shipments
            .values()
            .find(|row| &row.tracking_code == code)
            .map(|row| tables.record(row))
            .transpose()
    }

    async fn fetch_all(&self, selection: Selection<'_>) -> ShipmentResult<Vec<ShipmentRecord>> {
        let tables = self.tables.lock().await;
        tables
            .shipments
            .values()
            .rev()
            .filter(|row| match selection {
                Selection::All => true,
                Selection::Search(query) => [
                    row.details.shipment_number.as_str(),
                    row.details.invoice_number.as_str(),
                    row.tracking_code.as_str(),
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(query)),
                Selection::Ids(ids) => ids.contains(&row.id),
            })
            .map(|row| tables.record(row))
            .collect()
    }

    async fn tracking_code_exists(&self, code: &TrackingCode) -> ShipmentResult<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.shipments.values().any(|row| &row.tracking_code == code))
    }

    async fn update(&self, id: ShipmentId, update: ShipmentUpdate) -> ShipmentResult<bool> {
        self.write(move |t| {
            let Some(row) = t.shipments.get_mut(&id) else {
                return Ok(false);
            };
            row.details = update.details;
            row.final_price = update.final_price;
            let (sender_id, receiver_id) = (row.sender_id, row.receiver_id);
            t.contacts.replace(sender_id, update.sender)?;
            t.contacts.replace(receiver_id, update.receiver)?;
            Ok(true)
        })
        .await
    }

    async fn delete(&self, id: ShipmentId) -> ShipmentResult<bool> {
        self.write(move |t| {
            let Some(row) = t.shipments.remove(&id) else {
                return Ok(false);
            };
            t.status_log.remove_for(id);
            t.contacts.rows.remove(&row.sender_id);
            t.contacts.rows.remove(&row.receiver_id);
            Ok(true)
        })
        .await
    }

    async fn append_status(
        &self,
        ids: &[ShipmentId],
        change: &StatusChange,
    ) -> ShipmentResult<Vec<(ShipmentId, bool)>> {
        self.write(|t| {
            let mut outcomes = Vec::with_capacity(ids.len());
            for &id in ids {
                let Some(row) = t.shipments.get_mut(&id) else {
                    outcomes.push((id, false));
                    continue;
                };
                row.status = change.status;
                t.status_log.append(change.clone().for_shipment(id));
                outcomes.push((id, true));
            }
            Ok(outcomes)
        })
        .await
    }

    async fn counts(&self) -> ShipmentResult<TableCounts> {
        let tables = self.tables.lock().await;
        Ok(TableCounts {
            contacts: tables.contacts.rows.len() as u64,
            shipments: tables.shipments.len() as u64,
            status_updates: tables.status_log.events.len() as u64,
        })
    }
}
