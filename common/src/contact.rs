use serde::{Deserialize, Serialize};

/// Row id of a stored contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(pub i64);

/// Contact fields as submitted by staff, before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInput {
    pub name: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub address: String,
}

/// A sender or receiver record. Each contact belongs to exactly one role of
/// exactly one shipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
    pub country: String,
    pub city: String,
    pub address: String,
}

impl Contact {
    pub fn from_input(id: ContactId, input: ContactInput) -> Self {
        Self {
            id,
            name: input.name,
            phone: input.phone,
            country: input.country,
            city: input.city,
            address: input.address,
        }
    }

    /// The editable fields of this contact, without its id.
    pub fn to_input(&self) -> ContactInput {
        ContactInput {
            name: self.name.clone(),
            phone: self.phone.clone(),
            country: self.country.clone(),
            city: self.city.clone(),
            address: self.address.clone(),
        }
    }
}
