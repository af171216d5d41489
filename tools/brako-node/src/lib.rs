//! BRAKO shipment registry: aggregate repository, storage backends, admin
//! sessions and the HTTP API.

pub mod api;
pub mod config;
pub mod error;
pub mod repository;
pub mod session;
pub mod store;

pub use error::{ShipmentError, ShipmentResult};
pub use repository::ShipmentRepository;
