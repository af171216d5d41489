use tokio_postgres::{Row, Transaction};

use brako_common::contact::{Contact, ContactId, ContactInput};

use crate::error::ShipmentResult;

pub async fn insert(tx: &Transaction<'_>, contact: &ContactInput) -> ShipmentResult<ContactId> {
    let row = tx
        .query_one(
            "INSERT INTO contacts (name, phone, country, city, address)
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
            &[
                &contact.name,
                &contact.phone,
                &contact.country,
                &contact.city,
                &contact.address,
            ],
        )
        .await?;
    Ok(ContactId(row.try_get(0)?))
}

pub async fn replace(
    tx: &Transaction<'_>,
    id: ContactId,
    contact: &ContactInput,
) -> ShipmentResult<()> {
    tx.execute(
        "UPDATE contacts SET name = $2, phone = $3, country = $4, city = $5, address = $6
         WHERE id = $1",
        &[
            &id.0,
            &contact.name,
            &contact.phone,
            &contact.country,
            &contact.city,
            &contact.address,
        ],
    )
    .await?;
    Ok(())
}

pub async fn delete(tx: &Transaction<'_>, ids: &[ContactId]) -> ShipmentResult<u64> {
    let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
    Ok(tx
        .execute("DELETE FROM contacts WHERE id = ANY($1)", &[&ids])
        .await?)
}

/// Read a contact from columns aliased `<prefix>_id`, `<prefix>_name`, ...
pub fn from_row(row: &Row, prefix: &str) -> ShipmentResult<Contact> {
    let col = |name: &str| format!("{prefix}_{name}");
    Ok(Contact {
        id: ContactId(row.try_get(col("id").as_str())?),
        name: row.try_get(col("name").as_str())?,
        phone: row.try_get(col("phone").as_str())?,
        country: row.try_get(col("country").as_str())?,
        city: row.try_get(col("city").as_str())?,
        address: row.try_get(col("address").as_str())?,
    })
}
