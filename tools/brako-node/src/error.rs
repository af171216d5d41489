use brako_common::shipment::{AssemblyError, ShipmentId};
use brako_common::ValidationError;

pub type ShipmentResult<T> = Result<T, ShipmentError>;

/// Failures surfaced by the shipment repository. None of them are retried:
/// writes are not idempotent and a blind retry could mint a second tracking code.
#[derive(Debug, thiserror::Error)]
pub enum ShipmentError {
    #[error("invalid shipment: {0}")]
    Validation(#[from] ValidationError),

    #[error("shipment {0} not found")]
    NotFound(ShipmentId),

    #[error("no shipment with tracking code '{0}'")]
    UnknownTrackingCode(String),

    #[error("admin login required")]
    Unauthorized,

    #[error("store error: {0}")]
    Persistence(String),

    #[error("corrupt aggregate: {0}")]
    Corrupt(#[from] AssemblyError),
}

impl ShipmentError {
    /// Whether the failure came from the store rather than from the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, ShipmentError::Persistence(_) | ShipmentError::Corrupt(_))
    }
}

impl From<tokio_postgres::Error> for ShipmentError {
    fn from(e: tokio_postgres::Error) -> Self {
        ShipmentError::Persistence(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for ShipmentError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        ShipmentError::Persistence(format!("connection pool: {e}"))
    }
}
