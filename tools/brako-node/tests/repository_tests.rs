//! Repository behaviour against the in-memory store.

mod common;

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use brako_common::bulk::{BulkOutcome, BulkStatusUpdate};
use brako_common::currency::Currency;
use brako_common::shipment::{NewShipment, Shipment, ShipmentId};
use brako_common::status::{StatusChange, StatusCode, RECEIVED_NOTE};
use brako_common::tracking::{self, TrackingCode};
use brako_common::ValidationError;
use brako_node::store::{MemoryStore, ShipmentStore, TableCounts};
use brako_node::ShipmentError;

use common::{make_admin, make_dummy_input, make_repository, make_sessions, ManualClock, T0_MILLIS};

fn setup() -> (
    brako_node::ShipmentRepository,
    Arc<MemoryStore>,
    Arc<ManualClock>,
) {
    tracing_subscriber::fmt::try_init().ok();
    let store = Arc::new(MemoryStore::new());
    let clock = ManualClock::at(T0_MILLIS);
    let repo = make_repository(store.clone(), clock.clone());
    (repo, store, clock)
}

fn bulk(ids: &[i64], status: StatusCode) -> BulkStatusUpdate {
    BulkStatusUpdate {
        selected_ids: ids.iter().copied().map(ShipmentId).collect(),
        new_status: status,
        current_city: "Erbil".into(),
        status_notes: "crossed at Faysh Khabur".into(),
        date: NaiveDate::from_ymd_opt(2025, 5, 22),
        time: NaiveTime::from_hms_opt(7, 30, 0),
    }
}

#[tokio::test]
async fn create_then_get_returns_the_submitted_shipment() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let input = make_dummy_input("SH-1001", "brako");

    let created = repo.create(&admin, input.clone()).await.unwrap();
    assert_eq!(created.tracking_code.as_str(), "BRA38104512");
    assert_eq!(created.status, StatusCode::Received);
    assert_eq!(created.base_price(), Decimal::new(150, 0));
    assert_eq!(created.final_price, Decimal::new(158, 0));

    let fetched = repo.get(&admin, created.id).await.unwrap();
    assert_eq!(fetched, created);

    let mut expected = input;
    expected.status_history.clear();
    assert_eq!(fetched.to_input(), expected);

    let first = fetched.status_history.first().unwrap();
    assert_eq!(fetched.status_history.len(), 1);
    assert_eq!(first.status, StatusCode::Received);
    assert_eq!(first.city, "Qamishli");
    assert_eq!(first.notes, RECEIVED_NOTE);
    assert_eq!(first.shipment_id, created.id);
}

#[tokio::test]
async fn two_gets_without_a_write_are_equal() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let created = repo
        .create(&admin, make_dummy_input("SH-1", "brako"))
        .await
        .unwrap();
    let a = repo.get(&admin, created.id).await.unwrap();
    let b = repo.get(&admin, created.id).await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn light_parcels_are_billed_at_ten_kilos() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let mut input = make_dummy_input("SH-2", "brako");
    input.details.weight = Decimal::new(5, 0);
    input.details.unit_price = Decimal::new(20, 0);
    input.details.insurance = false;
    input.details.insurance_cost = Decimal::ZERO;
    input.details.packaging = false;
    input.details.packaging_cost = Decimal::ZERO;

    let created = repo.create(&admin, input).await.unwrap();
    assert_eq!(created.base_price(), Decimal::new(200, 0));
    assert_eq!(created.final_price, Decimal::new(200, 0));
}

#[tokio::test]
async fn addon_costs_are_charged_whatever_the_flags_say() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let mut input = make_dummy_input("SH-2b", "brako");
    input.details.insurance = false;
    input.details.packaging = false;

    let created = repo.create(&admin, input).await.unwrap();
    assert_eq!(created.base_price(), Decimal::new(150, 0));
    assert_eq!(created.final_price, Decimal::new(158, 0));
    assert!(!created.details.insurance);
    assert_eq!(created.details.insurance_cost, Decimal::new(5, 0));
}

#[tokio::test]
async fn missing_history_entry_is_synthesized_from_the_clock() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let mut input = make_dummy_input("SH-3", "brako");
    input.status_history.clear();

    let created = repo.create(&admin, input).await.unwrap();
    let first = created.status_history.first().unwrap();
    assert_eq!(first.notes, RECEIVED_NOTE);
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    assert_eq!(first.time, NaiveTime::from_hms_opt(16, 48, 24).unwrap());

    let json = serde_json::to_string(&created).unwrap();
    let back: Shipment = serde_json::from_str(&json).unwrap();
    assert_eq!(back, created);
}

#[tokio::test]
async fn topeka_shipments_get_the_top_prefix() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let created = repo
        .create(&admin, make_dummy_input("SH-4", "topeka"))
        .await
        .unwrap();
    assert_eq!(created.tracking_code.as_str(), "TOP38104512");
}

#[tokio::test]
async fn colliding_tracking_codes_advance_to_the_next_millisecond() {
    let (repo, _, clock) = setup();
    let admin = make_admin(&make_sessions());

    let a = repo
        .create(&admin, make_dummy_input("SH-5", "brako"))
        .await
        .unwrap();
    // Same instant again.
    clock.set(T0_MILLIS);
    let b = repo
        .create(&admin, make_dummy_input("SH-6", "brako"))
        .await
        .unwrap();

    assert_eq!(a.tracking_code, tracking::generate("brako", T0_MILLIS));
    assert_eq!(b.tracking_code, tracking::generate("brako", T0_MILLIS + 1));
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
    let (repo, store, _) = setup();
    let admin = make_admin(&make_sessions());

    let mut input = make_dummy_input("", "brako");
    input.receiver.name = "  ".into();
    let err = repo.create(&admin, input).await.unwrap_err();
    assert!(matches!(
        err,
        ShipmentError::Validation(ValidationError::MissingFields(ref fields))
            if fields == &vec!["shipmentNumber", "receiver.name"]
    ));

    let mut input = make_dummy_input("SH-7", "brako");
    input.details.unit_price = Decimal::new(-1, 0);
    assert!(matches!(
        repo.create(&admin, input).await,
        Err(ShipmentError::Validation(ValidationError::Negative("unitPrice")))
    ));

    assert_eq!(store.counts().await.unwrap(), TableCounts::default());
}

#[tokio::test]
async fn update_recomputes_price_and_keeps_history() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let created = repo
        .create(&admin, make_dummy_input("SH-8", "brako"))
        .await
        .unwrap();
    repo.bulk_update_status(&admin, &bulk(&[created.id.0], StatusCode::Departed))
        .await
        .unwrap();

    let mut input = created.to_input();
    input.details.weight = Decimal::new(20, 0);
    input.details.currency = Currency::Iqd;
    input.receiver.city = "Duhok".into();
    // Ignored on update.
    input.status_history = make_dummy_input("x", "brako").status_history;

    let updated = repo.update(&admin, created.id, input).await.unwrap();
    assert_eq!(updated.final_price, Decimal::new(208, 0));
    assert_eq!(updated.details.currency, Currency::Iqd);
    assert_eq!(updated.receiver.city, "Duhok");
    assert_eq!(updated.receiver.id, created.receiver.id);
    assert_eq!(updated.tracking_code, created.tracking_code);
    assert_eq!(updated.status, StatusCode::Departed);
    assert_eq!(updated.status_history.len(), 2);
}

#[tokio::test]
async fn update_and_delete_of_unknown_ids_are_not_found() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    assert!(matches!(
        repo.update(&admin, ShipmentId(42), make_dummy_input("SH-9", "brako"))
            .await,
        Err(ShipmentError::NotFound(ShipmentId(42)))
    ));
    assert!(matches!(
        repo.delete(&admin, ShipmentId(42)).await,
        Err(ShipmentError::NotFound(ShipmentId(42)))
    ));
    assert!(matches!(
        repo.get(&admin, ShipmentId(42)).await,
        Err(ShipmentError::NotFound(ShipmentId(42)))
    ));
}

#[tokio::test]
async fn delete_removes_contacts_and_events() {
    let (repo, store, clock) = setup();
    let admin = make_admin(&make_sessions());
    let keep = repo
        .create(&admin, make_dummy_input("SH-10", "brako"))
        .await
        .unwrap();
    clock.set(T0_MILLIS + 1_000);
    let doomed = repo
        .create(&admin, make_dummy_input("SH-11", "brako"))
        .await
        .unwrap();
    repo.bulk_update_status(&admin, &bulk(&[doomed.id.0], StatusCode::Returned))
        .await
        .unwrap();

    repo.delete(&admin, doomed.id).await.unwrap();

    assert!(matches!(
        repo.get(&admin, doomed.id).await,
        Err(ShipmentError::NotFound(_))
    ));
    assert_eq!(
        store.counts().await.unwrap(),
        TableCounts {
            contacts: 2,
            shipments: 1,
            status_updates: 1,
        }
    );
    assert_eq!(repo.get(&admin, keep.id).await.unwrap(), keep);
}

#[tokio::test]
async fn list_is_newest_first_and_search_is_case_insensitive() {
    let (repo, _, clock) = setup();
    let admin = make_admin(&make_sessions());
    let mut ids = Vec::new();
    for (i, number) in ["ABC123-x", "zzz-9", "abc123"].iter().enumerate() {
        clock.set(T0_MILLIS + i as i64 * 1_000);
        ids.push(
            repo.create(&admin, make_dummy_input(number, "brako"))
                .await
                .unwrap()
                .id,
        );
    }

    let listed: Vec<_> = repo.list(&admin).await.unwrap().iter().map(|s| s.id).collect();
    assert_eq!(listed, vec![ids[2], ids[1], ids[0]]);

    let found: Vec<_> = repo
        .search(&admin, "ABC123")
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    assert_eq!(found, vec![ids[2], ids[0]]);

    // Invoice numbers and tracking codes are searched too.
    assert_eq!(repo.search(&admin, "inv-zzz").await.unwrap().len(), 1);
    assert_eq!(repo.search(&admin, "bra3810").await.unwrap().len(), 3);
    assert_eq!(repo.search(&admin, "").await.unwrap().len(), 3);
    assert!(repo.search(&admin, "Ahmad").await.unwrap().is_empty());
}

#[tokio::test]
async fn bulk_update_appends_one_event_per_shipment_and_skips_unknown_ids() {
    let (repo, _, clock) = setup();
    let admin = make_admin(&make_sessions());
    let a = repo
        .create(&admin, make_dummy_input("SH-12", "brako"))
        .await
        .unwrap();
    clock.set(T0_MILLIS + 1);
    let b = repo
        .create(&admin, make_dummy_input("SH-13", "brako"))
        .await
        .unwrap();

    let report = repo
        .bulk_update_status(&admin, &bulk(&[a.id.0, b.id.0, 999], StatusCode::InTransit))
        .await
        .unwrap();
    assert_eq!(report.updated_count(), 2);
    assert_eq!(report.not_found().collect::<Vec<_>>(), vec![ShipmentId(999)]);
    assert_eq!(report.items[0].outcome, BulkOutcome::Updated);

    for id in [a.id, b.id] {
        let shipment = repo.get(&admin, id).await.unwrap();
        assert_eq!(shipment.status, StatusCode::InTransit);
        assert_eq!(shipment.status_history.len(), 2);
        let latest = shipment.status_history.latest().unwrap();
        assert_eq!(latest.status, StatusCode::InTransit);
        assert_eq!(latest.city, "Erbil");
        assert_eq!(
            shipment.status_history.first().unwrap().status,
            StatusCode::Received
        );
    }
}

#[tokio::test]
async fn bulk_update_without_a_time_is_stamped_to_the_second() {
    let (repo, _, clock) = setup();
    let admin = make_admin(&make_sessions());
    let created = repo
        .create(&admin, make_dummy_input("SH-15", "brako"))
        .await
        .unwrap();

    clock.set(T0_MILLIS + 60_250);
    let mut request = bulk(&[created.id.0], StatusCode::Delayed);
    request.date = None;
    request.time = None;
    repo.bulk_update_status(&admin, &request).await.unwrap();

    let shipment = repo.get(&admin, created.id).await.unwrap();
    let latest = shipment.status_history.latest().unwrap();
    assert_eq!(latest.date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    assert_eq!(latest.time, NaiveTime::from_hms_opt(16, 49, 24).unwrap());

    let json = serde_json::to_string(&shipment).unwrap();
    let back: Shipment = serde_json::from_str(&json).unwrap();
    assert_eq!(back, shipment);
}

#[tokio::test]
async fn any_status_may_follow_any_other() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let created = repo
        .create(&admin, make_dummy_input("SH-14", "brako"))
        .await
        .unwrap();
    for status in [StatusCode::ReadyPickup, StatusCode::Received, StatusCode::Delayed] {
        repo.bulk_update_status(&admin, &bulk(&[created.id.0], status))
            .await
            .unwrap();
    }
    let shipment = repo.get(&admin, created.id).await.unwrap();
    let statuses: Vec<_> = shipment.status_history.iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![
            StatusCode::Received,
            StatusCode::ReadyPickup,
            StatusCode::Received,
            StatusCode::Delayed,
        ]
    );
    assert_eq!(shipment.status, StatusCode::Delayed);
}

#[tokio::test]
async fn track_is_public_and_exact() {
    let (repo, _, _) = setup();
    let admin = make_admin(&make_sessions());
    let created = repo
        .create(&admin, make_dummy_input("SH-15", "brako"))
        .await
        .unwrap();

    let info = repo.track(" BRA38104512 ").await.unwrap();
    assert_eq!(info.tracking_code, created.tracking_code);
    assert_eq!(info.receiver_city, "Erbil");
    assert_eq!(info.status_history.len(), 1);

    assert!(matches!(
        repo.track("BRA3810451").await,
        Err(ShipmentError::UnknownTrackingCode(_))
    ));
}

#[tokio::test]
async fn stats_and_report_rows() {
    let (repo, _, clock) = setup();
    let admin = make_admin(&make_sessions());
    let a = repo
        .create(&admin, make_dummy_input("SH-16", "brako"))
        .await
        .unwrap();
    clock.set(T0_MILLIS + 1);
    let b = repo
        .create(&admin, make_dummy_input("SH-17", "topeka"))
        .await
        .unwrap();
    repo.bulk_update_status(&admin, &bulk(&[b.id.0], StatusCode::ReadyPickup))
        .await
        .unwrap();

    let stats = repo.stats(&admin).await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.revenue[&Currency::Usd], Decimal::new(316, 0));

    let rows = repo.report(&admin, &[a.id, b.id]).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].shipment_number, "SH-17");
    assert_eq!(rows[0].base_price, "150.00");
    assert_eq!(rows[0].final_price, "158.00");
    assert_eq!(rows[0].status, "ready_pickup");

    assert!(matches!(
        repo.report(&admin, &[]).await,
        Err(ShipmentError::Validation(ValidationError::Malformed(_)))
    ));
}

#[tokio::test]
async fn failed_store_write_leaves_no_partial_rows() {
    let store = MemoryStore::new();
    let input = make_dummy_input("SH-18", "brako");
    let new_shipment = |number: &str| NewShipment {
        details: {
            let mut d = input.details.clone();
            d.shipment_number = number.into();
            d
        },
        sender: input.sender.clone(),
        receiver: input.receiver.clone(),
        final_price: Decimal::new(158, 0),
        tracking_code: TrackingCode("BRA00000001".into()),
        initial_status: StatusChange {
            status: StatusCode::Received,
            city: String::new(),
            notes: RECEIVED_NOTE.into(),
            date: input.details.date,
            time: input.details.time,
        },
    };

    store.insert(new_shipment("SH-18")).await.unwrap();
    let before = store.counts().await.unwrap();

    // A duplicate tracking code is rejected as a whole.
    assert!(store.insert(new_shipment("SH-19")).await.is_err());
    assert_eq!(store.counts().await.unwrap(), before);
    assert_eq!(
        before,
        TableCounts {
            contacts: 2,
            shipments: 1,
            status_updates: 1,
        }
    );
}
