use rust_decimal::Decimal;

use crate::shipment::ShipmentInput;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("{0}")]
    Malformed(String),
}

impl ShipmentInput {
    /// Check the fields the admin form requires before anything is written.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("shipmentNumber", self.details.shipment_number.as_str()),
            ("sender.name", self.sender.name.as_str()),
            ("receiver.name", self.receiver.name.as_str()),
            ("branch", self.details.branch.as_str()),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields(missing));
        }

        let amounts = [
            ("weight", self.details.weight),
            ("unitPrice", self.details.unit_price),
            ("insuranceCost", self.details.insurance_cost),
            ("packagingCost", self.details.packaging_cost),
        ];
        if let Some((name, _)) = amounts.iter().find(|(_, v)| *v < Decimal::ZERO) {
            return Err(ValidationError::Negative(*name));
        }

        Ok(())
    }
}
