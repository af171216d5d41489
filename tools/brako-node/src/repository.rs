use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, error, info, warn};

use brako_common::bulk::{BulkStatusReport, BulkStatusUpdate};
use brako_common::report::{report_rows, ReportRow};
use brako_common::shipment::{
    assemble, NewShipment, Shipment, ShipmentId, ShipmentInput, ShipmentRecord, ShipmentUpdate,
    TrackingInfo,
};
use brako_common::stats::ShipmentStats;
use brako_common::tracking::{self, TrackingClock, TrackingCode};
use brako_common::ValidationError;

use crate::error::{ShipmentError, ShipmentResult};
use crate::session::AdminCapability;
use crate::store::{Selection, ShipmentStore, TableCounts};

/// How many consecutive milliseconds are probed for a free tracking code.
pub const TRACKING_CODE_ATTEMPTS: i64 = 64;

/// Reads and writes whole shipment aggregates on top of a [`ShipmentStore`].
///
/// Every admin operation takes an [`AdminCapability`]; only [`track`] is
/// public.
///
/// [`track`]: ShipmentRepository::track
#[derive(Clone)]
pub struct ShipmentRepository {
    store: Arc<dyn ShipmentStore>,
    clock: Arc<dyn TrackingClock>,
}

impl ShipmentRepository {
    pub fn new(store: Arc<dyn ShipmentStore>, clock: Arc<dyn TrackingClock>) -> Self {
        Self { store, clock }
    }

    /// Event timestamps are kept to the second, which is all the wire format carries.
    fn now(&self) -> NaiveDateTime {
        let secs = self.clock.now_millis().div_euclid(1000);
        DateTime::<Utc>::from_timestamp(secs, 0)
            .unwrap_or_default()
            .naive_utc()
    }

    pub async fn create(
        &self,
        cap: &AdminCapability,
        input: ShipmentInput,
    ) -> ShipmentResult<Shipment> {
        input.validate()?;
        let ShipmentInput {
            details,
            sender,
            receiver,
            status_history,
        } = input;

        let price = details.price();
        let tracking_code = self.allocate_tracking_code(&details.branch).await?;
        let initial_status = status_history
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_received(self.now());

        let id = self
            .store
            .insert(NewShipment {
                details,
                sender,
                receiver,
                final_price: price.final_price,
                tracking_code: tracking_code.clone(),
                initial_status,
            })
            .await
            .inspect_err(log_store_failure)?;
        info!(%id, %tracking_code, admin = cap.username(), "shipment created");
        self.load(id).await
    }

    /// First free code for `branch`, starting at the clock's current
    /// millisecond and moving forward one millisecond per collision.
    async fn allocate_tracking_code(&self, branch: &str) -> ShipmentResult<TrackingCode> {
        let start = self.clock.now_millis();
        for offset in 0..TRACKING_CODE_ATTEMPTS {
            let code = tracking::generate(branch, start + offset);
            if !self.store.tracking_code_exists(&code).await? {
                return Ok(code);
            }
            debug!(%code, "tracking code taken");
        }
        Err(ShipmentError::Persistence(format!(
            "no free tracking code after {TRACKING_CODE_ATTEMPTS} attempts"
        )))
    }

    pub async fn get(&self, _cap: &AdminCapability, id: ShipmentId) -> ShipmentResult<Shipment> {
        self.load(id).await
    }

    async fn load(&self, id: ShipmentId) -> ShipmentResult<Shipment> {
        let record = self.store.fetch(id).await?;
        let record = record.ok_or(ShipmentError::NotFound(id))?;
        assemble_logged(record)
    }

    /// Every shipment, newest first.
    pub async fn list(&self, _cap: &AdminCapability) -> ShipmentResult<Vec<Shipment>> {
        self.select(Selection::All).await
    }

    /// Case-insensitive substring search over shipment number, invoice number
    /// and tracking code. An empty query returns everything.
    pub async fn search(
        &self,
        _cap: &AdminCapability,
        query: &str,
    ) -> ShipmentResult<Vec<Shipment>> {
        let lowered = query.to_lowercase();
        let found = self.select(Selection::Search(&lowered)).await?;
        debug!(query, hits = found.len(), "shipment search");
        Ok(found)
    }

    async fn select(&self, selection: Selection<'_>) -> ShipmentResult<Vec<Shipment>> {
        self.store
            .fetch_all(selection)
            .await?
            .into_iter()
            .map(assemble_logged)
            .collect()
    }

    pub async fn update(
        &self,
        cap: &AdminCapability,
        id: ShipmentId,
        input: ShipmentInput,
    ) -> ShipmentResult<Shipment> {
        input.validate()?;
        let final_price = input.details.price().final_price;
        let updated = self
            .store
            .update(
                id,
                ShipmentUpdate {
                    details: input.details,
                    sender: input.sender,
                    receiver: input.receiver,
                    final_price,
                },
            )
            .await
            .inspect_err(log_store_failure)?;
        if !updated {
            return Err(ShipmentError::NotFound(id));
        }
        info!(%id, admin = cap.username(), "shipment updated");
        self.load(id).await
    }

    pub async fn delete(&self, cap: &AdminCapability, id: ShipmentId) -> ShipmentResult<()> {
        let deleted = self
            .store
            .delete(id)
            .await
            .inspect_err(log_store_failure)?;
        if !deleted {
            return Err(ShipmentError::NotFound(id));
        }
        info!(%id, admin = cap.username(), "shipment deleted");
        Ok(())
    }

    pub async fn bulk_update_status(
        &self,
        cap: &AdminCapability,
        request: &BulkStatusUpdate,
    ) -> ShipmentResult<BulkStatusReport> {
        let ids = request.unique_ids();
        let change = request.change(self.now());
        let outcomes = self
            .store
            .append_status(&ids, &change)
            .await
            .inspect_err(log_store_failure)?;

        let report = BulkStatusReport::from_outcomes(outcomes);
        for id in report.not_found() {
            warn!(%id, "bulk status update skipped unknown shipment");
        }
        info!(
            status = %change.status,
            updated = report.updated_count(),
            admin = cap.username(),
            "bulk status update"
        );
        Ok(report)
    }

    /// Public lookup for the customer tracking page.
    pub async fn track(&self, code: &str) -> ShipmentResult<TrackingInfo> {
        let code = TrackingCode(code.trim().to_string());
        let record = self
            .store
            .fetch_by_tracking_code(&code)
            .await?
            .ok_or_else(|| ShipmentError::UnknownTrackingCode(code.to_string()))?;
        Ok(assemble_logged(record)?.tracking_info())
    }

    pub async fn stats(&self, cap: &AdminCapability) -> ShipmentResult<ShipmentStats> {
        let shipments = self.list(cap).await?;
        Ok(ShipmentStats::from_shipments(&shipments))
    }

    /// Rows for the spreadsheet and print formatters, newest first.
    pub async fn report(
        &self,
        _cap: &AdminCapability,
        ids: &[ShipmentId],
    ) -> ShipmentResult<Vec<ReportRow>> {
        if ids.is_empty() {
            return Err(ValidationError::Malformed("no shipments selected".into()).into());
        }
        let shipments = self.select(Selection::Ids(ids)).await?;
        Ok(report_rows(&shipments))
    }

    pub async fn counts(&self) -> ShipmentResult<TableCounts> {
        self.store.counts().await
    }
}

fn assemble_logged(record: ShipmentRecord) -> ShipmentResult<Shipment> {
    assemble(record).map_err(|e| {
        error!(error = %e, "stored rows do not form a valid shipment");
        ShipmentError::Corrupt(e)
    })
}

fn log_store_failure(e: &ShipmentError) {
    if e.is_internal() {
        error!(error = %e, "shipment write failed");
    }
}
