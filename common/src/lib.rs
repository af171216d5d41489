pub mod bulk;
pub mod contact;
pub mod currency;
pub mod pricing;
pub mod report;
pub mod shipment;
pub mod stats;
pub mod status;
pub mod timefmt;
pub mod tracking;
pub mod validation;

pub use validation::ValidationError;
