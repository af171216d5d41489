use std::collections::HashMap;

use tokio_postgres::{Client, Transaction};

use brako_common::shipment::ShipmentId;
use brako_common::status::{StatusChange, StatusEvent};

use super::parse_column;
use crate::error::ShipmentResult;

pub async fn append(
    tx: &Transaction<'_>,
    id: ShipmentId,
    change: &StatusChange,
) -> ShipmentResult<()> {
    tx.execute(
        "INSERT INTO status_updates (shipment_id, status, city, notes, date, time)
         VALUES ($1, $2, $3, $4, $5, $6)",
        &[
            &id.0,
            &change.status.as_str(),
            &change.city,
            &change.notes,
            &change.date,
            &change.time,
        ],
    )
    .await?;
    Ok(())
}

pub async fn delete_for(tx: &Transaction<'_>, id: ShipmentId) -> ShipmentResult<u64> {
    Ok(tx
        .execute("DELETE FROM status_updates WHERE shipment_id = $1", &[&id.0])
        .await?)
}

/// Events for every shipment in `ids`, grouped per shipment in insertion order.
pub async fn events_for(
    client: &Client,
    ids: &[ShipmentId],
) -> ShipmentResult<HashMap<ShipmentId, Vec<StatusEvent>>> {
    let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
    let rows = client
        .query(
            "SELECT shipment_id, status, city, notes, date, time
             FROM status_updates WHERE shipment_id = ANY($1) ORDER BY id",
            &[&ids],
        )
        .await?;

    let mut grouped: HashMap<ShipmentId, Vec<StatusEvent>> = HashMap::new();
    for row in rows {
        let shipment_id = ShipmentId(row.try_get("shipment_id")?);
        let status: &str = row.try_get("status")?;
        grouped.entry(shipment_id).or_default().push(StatusEvent {
            shipment_id,
            status: parse_column(status)?,
            city: row.try_get("city")?,
            notes: row.try_get("notes")?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
        });
    }
    Ok(grouped)
}
