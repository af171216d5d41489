//! PostgreSQL backend over a deadpool connection pool.
//!
//! Writes run inside one transaction each; dropping an uncommitted
//! transaction rolls it back. Reads load shipment rows joined with both
//! contacts, then batch-load status events with `shipment_id = ANY($1)`.

mod contacts;
pub mod schema;
mod status_log;

use std::fmt::Display;
use std::str::FromStr;

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::{NoTls, Row};
use tracing::{debug, info};

use brako_common::contact::ContactId;
use brako_common::shipment::{
    NewShipment, ShipmentDetails, ShipmentId, ShipmentRecord, ShipmentRow, ShipmentUpdate,
};
use brako_common::status::StatusChange;
use brako_common::tracking::TrackingCode;

use super::{Selection, ShipmentStore, TableCounts};
use crate::error::{ShipmentError, ShipmentResult};

const SELECT_RECORDS: &str = "
SELECT s.id, s.shipment_number, s.invoice_number, s.date, s.time, s.branch,
       s.shipping_type, s.sender_id, s.receiver_id, s.payment_method,
       s.insurance, s.insurance_cost, s.packaging, s.packaging_cost,
       s.quantity, s.unit_price, s.weight, s.item_type, s.contents,
       s.final_price, s.currency, s.status, s.tracking_code,
       snd.id AS snd_id, snd.name AS snd_name, snd.phone AS snd_phone,
       snd.country AS snd_country, snd.city AS snd_city, snd.address AS snd_address,
       rcv.id AS rcv_id, rcv.name AS rcv_name, rcv.phone AS rcv_phone,
       rcv.country AS rcv_country, rcv.city AS rcv_city, rcv.address AS rcv_address
FROM shipments s
JOIN contacts snd ON snd.id = s.sender_id
JOIN contacts rcv ON rcv.id = s.receiver_id";

/// Parse a TEXT enum column.
pub(crate) fn parse_column<T>(value: &str) -> ShipmentResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ShipmentError::Persistence(format!("bad column value: {e}")))
}

pub struct PostgresStore {
    pool: Pool,
}

impl PostgresStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool for `url` (a libpq-style connection string or URL).
    pub fn connect(url: &str, max_size: usize) -> ShipmentResult<Self> {
        let config: tokio_postgres::Config = url.parse()?;
        let manager = Manager::from_config(
            config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .build()
            .map_err(|e| ShipmentError::Persistence(format!("connection pool: {e}")))?;
        Ok(Self::new(pool))
    }

    pub async fn init_schema(&self) -> ShipmentResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(schema::CREATE_TABLES).await?;
        info!("shipment tables ready");
        Ok(())
    }

    async fn load(
        &self,
        filter: &str,
        params: &[&(dyn tokio_postgres::types::ToSql + Sync)],
    ) -> ShipmentResult<Vec<ShipmentRecord>> {
        let client = self.pool.get().await?;
        let sql = format!("{SELECT_RECORDS} {filter} ORDER BY s.id DESC");
        let rows = client.query(sql.as_str(), params).await?;

        let mut partial = Vec::with_capacity(rows.len());
        for row in &rows {
            partial.push(record_from_row(row)?);
        }
        let ids: Vec<ShipmentId> = partial.iter().map(|r| r.row.id).collect();
        let mut events = status_log::events_for(&client, &ids).await?;
        for record in &mut partial {
            record.events = events.remove(&record.row.id).unwrap_or_default();
        }
        debug!(count = partial.len(), "loaded shipment records");
        Ok(partial)
    }
}

fn record_from_row(row: &Row) -> ShipmentResult<ShipmentRecord> {
    let quantity: i64 = row.try_get("quantity")?;
    let details = ShipmentDetails {
        shipment_number: row.try_get("shipment_number")?,
        invoice_number: row.try_get("invoice_number")?,
        date: row.try_get("date")?,
        time: row.try_get("time")?,
        branch: row.try_get("branch")?,
        shipping_type: parse_column(row.try_get("shipping_type")?)?,
        payment_method: parse_column(row.try_get("payment_method")?)?,
        insurance: row.try_get("insurance")?,
        insurance_cost: row.try_get("insurance_cost")?,
        packaging: row.try_get("packaging")?,
        packaging_cost: row.try_get("packaging_cost")?,
        quantity: u32::try_from(quantity).map_err(|_| {
            ShipmentError::Persistence(format!("quantity {quantity} out of range"))
        })?,
        unit_price: row.try_get("unit_price")?,
        weight: row.try_get("weight")?,
        item_type: row.try_get("item_type")?,
        contents: row.try_get("contents")?,
        currency: parse_column(row.try_get("currency")?)?,
    };

    Ok(ShipmentRecord {
        row: ShipmentRow {
            id: ShipmentId(row.try_get("id")?),
            details,
            sender_id: ContactId(row.try_get("sender_id")?),
            receiver_id: ContactId(row.try_get("receiver_id")?),
            final_price: row.try_get("final_price")?,
            status: parse_column(row.try_get("status")?)?,
            tracking_code: TrackingCode(row.try_get("tracking_code")?),
        },
        sender: contacts::from_row(row, "snd")?,
        receiver: contacts::from_row(row, "rcv")?,
        events: Vec::new(),
    })
}

#[async_trait]
impl ShipmentStore for PostgresStore {
    async fn insert(&self, shipment: NewShipment) -> ShipmentResult<ShipmentId> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let sender_id = contacts::insert(&tx, &shipment.sender).await?;
        let receiver_id = contacts::insert(&tx, &shipment.receiver).await?;

        let d = &shipment.details;
        let row = tx
            .query_one(
                "INSERT INTO shipments (
                    shipment_number, invoice_number, date, time, branch, shipping_type,
                    sender_id, receiver_id, payment_method, insurance, insurance_cost,
                    packaging, packaging_cost, quantity, unit_price, weight, item_type,
                    contents, final_price, currency, status, tracking_code)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                         $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
                 RETURNING id",
                &[
                    &d.shipment_number,
                    &d.invoice_number,
                    &d.date,
                    &d.time,
                    &d.branch,
                    &d.shipping_type.as_str(),
                    &sender_id.0,
                    &receiver_id.0,
                    &d.payment_method.as_str(),
                    &d.insurance,
                    &d.insurance_cost,
                    &d.packaging,
                    &d.packaging_cost,
                    &i64::from(d.quantity),
                    &d.unit_price,
                    &d.weight,
                    &d.item_type,
                    &d.contents,
                    &shipment.final_price,
                    &d.currency.code(),
                    &shipment.initial_status.status.as_str(),
                    &shipment.tracking_code.as_str(),
                ],
            )
            .await?;
        let id = ShipmentId(row.try_get(0)?);

        status_log::append(&tx, id, &shipment.initial_status).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn fetch(&self, id: ShipmentId) -> ShipmentResult<Option<ShipmentRecord>> {
        Ok(self
            .load("WHERE s.id = $1", &[&id.0])
            .await?
            .into_iter()
            .next())
    }

    async fn fetch_by_tracking_code(
        &self,
        code: &TrackingCode,
    ) -> ShipmentResult<Option<ShipmentRecord>> {
        Ok(self
            .load("WHERE s.tracking_code = $1", &[&code.as_str()])
            .await?
            .into_iter()
            .next())
    }

    async fn fetch_all(&self, selection: Selection<'_>) -> ShipmentResult<Vec<ShipmentRecord>> {
        match selection {
            Selection::All => self.load("", &[]).await,
            // strpos keeps `%` and `_` in the query literal.
            Selection::Search(query) => {
                self.load(
                    "WHERE strpos(lower(s.shipment_number), $1) > 0
                        OR strpos(lower(s.invoice_number), $1) > 0
                        OR strpos(lower(s.tracking_code), $1) > 0",
                    &[&query],
                )
                .await
            }
            Selection::Ids(ids) => {
                let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
                self.load("WHERE s.id = ANY($1)", &[&ids]).await
            }
        }
    }

    async fn tracking_code_exists(&self, code: &TrackingCode) -> ShipmentResult<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM shipments WHERE tracking_code = $1)",
                &[&code.as_str()],
            )
            .await?;
        Ok(row.try_get(0)?)
    }

    async fn update(&self, id: ShipmentId, update: ShipmentUpdate) -> ShipmentResult<bool> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let Some(refs) = tx
            .query_opt(
                "SELECT sender_id, receiver_id FROM shipments WHERE id = $1 FOR UPDATE",
                &[&id.0],
            )
            .await?
        else {
            return Ok(false);
        };
        let sender_id = ContactId(refs.try_get(0)?);
        let receiver_id = ContactId(refs.try_get(1)?);

        contacts::replace(&tx, sender_id, &update.sender).await?;
        contacts::replace(&tx, receiver_id, &update.receiver).await?;

        let d = &update.details;
        tx.execute(
            "UPDATE shipments SET
                shipment_number = $2, invoice_number = $3, date = $4, time = $5,
                branch = $6, shipping_type = $7, payment_method = $8, insurance = $9,
                insurance_cost = $10, packaging = $11, packaging_cost = $12,
                quantity = $13, unit_price = $14, weight = $15, item_type = $16,
                contents = $17, final_price = $18, currency = $19
             WHERE id = $1",
            &[
                &id.0,
                &d.shipment_number,
                &d.invoice_number,
                &d.date,
                &d.time,
                &d.branch,
                &d.shipping_type.as_str(),
                &d.payment_method.as_str(),
                &d.insurance,
                &d.insurance_cost,
                &d.packaging,
                &d.packaging_cost,
                &i64::from(d.quantity),
                &d.unit_price,
                &d.weight,
                &d.item_type,
                &d.contents,
                &update.final_price,
                &d.currency.code(),
            ],
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn delete(&self, id: ShipmentId) -> ShipmentResult<bool> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let Some(refs) = tx
            .query_opt(
                "SELECT sender_id, receiver_id FROM shipments WHERE id = $1 FOR UPDATE",
                &[&id.0],
            )
            .await?
        else {
            return Ok(false);
        };
        let contact_ids = [ContactId(refs.try_get(0)?), ContactId(refs.try_get(1)?)];

        let events = status_log::delete_for(&tx, id).await?;
        tx.execute("DELETE FROM shipments WHERE id = $1", &[&id.0])
            .await?;
        contacts::delete(&tx, &contact_ids).await?;

        tx.commit().await?;
        debug!(%id, events, "deleted shipment rows");
        Ok(true)
    }

    async fn append_status(
        &self,
        ids: &[ShipmentId],
        change: &StatusChange,
    ) -> ShipmentResult<Vec<(ShipmentId, bool)>> {
        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;

        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            let touched = tx
                .execute(
                    "UPDATE shipments SET status = $2 WHERE id = $1",
                    &[&id.0, &change.status.as_str()],
                )
                .await?;
            if touched == 0 {
                outcomes.push((id, false));
                continue;
            }
            status_log::append(&tx, id, change).await?;
            outcomes.push((id, true));
        }

        tx.commit().await?;
        Ok(outcomes)
    }

    async fn counts(&self) -> ShipmentResult<TableCounts> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT (SELECT count(*) FROM contacts),
                        (SELECT count(*) FROM shipments),
                        (SELECT count(*) FROM status_updates)",
                &[],
            )
            .await?;
        let count = |idx: usize| -> ShipmentResult<u64> {
            let n: i64 = row.try_get(idx)?;
            Ok(n.max(0) as u64)
        };
        Ok(TableCounts {
            contacts: count(0)?,
            shipments: count(1)?,
            status_updates: count(2)?,
        })
    }
}
