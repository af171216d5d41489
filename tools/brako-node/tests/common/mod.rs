//! Fixtures shared by the integration test binaries.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use brako_common::contact::ContactInput;
use brako_common::currency::Currency;
use brako_common::shipment::{PaymentMethod, ShipmentDetails, ShipmentInput, ShippingType};
use brako_common::status::StatusEntryInput;
use brako_common::tracking::TrackingClock;
use brako_node::session::{AdminCapability, AdminCredentials, SessionStore};
use brako_node::store::ShipmentStore;
use brako_node::ShipmentRepository;

pub const ADMIN_USER: &str = "brako";
pub const ADMIN_PASSWORD: &str = "correct horse";

/// 2024-06-10T16:48:24.512Z; codes minted at this instant end in `38104512`.
pub const T0_MILLIS: i64 = 1_718_038_104_512;

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(millis)))
    }

    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl TrackingClock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn make_sessions() -> SessionStore {
    SessionStore::new(
        AdminCredentials::from_password(ADMIN_USER, ADMIN_PASSWORD),
        chrono::Duration::minutes(30),
    )
}

/// Log in and turn the token into a capability, as the HTTP layer does.
pub fn make_admin(sessions: &SessionStore) -> AdminCapability {
    let token = sessions.login(ADMIN_USER, ADMIN_PASSWORD).unwrap();
    sessions.authorize(&token).unwrap()
}

pub fn make_repository(
    store: Arc<dyn ShipmentStore>,
    clock: Arc<ManualClock>,
) -> ShipmentRepository {
    ShipmentRepository::new(store, clock)
}

pub fn make_contact(name: &str, country: &str, city: &str) -> ContactInput {
    ContactInput {
        name: name.into(),
        phone: "+964 750 000 0000".into(),
        country: country.into(),
        city: city.into(),
        address: "Main street 1".into(),
    }
}

/// 15 kg at 10 per kg with 5 insurance and 3 packaging: base 150, final 158.
pub fn make_dummy_input(shipment_number: &str, branch: &str) -> ShipmentInput {
    ShipmentInput {
        details: ShipmentDetails {
            shipment_number: shipment_number.into(),
            invoice_number: format!("INV-{shipment_number}"),
            date: NaiveDate::from_ymd_opt(2025, 5, 20).unwrap(),
            time: NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            branch: branch.into(),
            shipping_type: ShippingType::International,
            payment_method: PaymentMethod::Prepaid,
            insurance: true,
            insurance_cost: Decimal::new(5, 0),
            packaging: true,
            packaging_cost: Decimal::new(3, 0),
            quantity: 3,
            unit_price: Decimal::new(10, 0),
            weight: Decimal::new(15, 0),
            item_type: "textiles".into(),
            contents: "carpets".into(),
            currency: Currency::Usd,
        },
        sender: make_contact("Ahmad Saleh", "Syria", "Qamishli"),
        receiver: make_contact("Layla Aziz", "Iraq", "Erbil"),
        status_history: vec![StatusEntryInput {
            city: "Qamishli".into(),
            date: NaiveDate::from_ymd_opt(2025, 5, 20),
            time: NaiveTime::from_hms_opt(10, 45, 0),
            ..StatusEntryInput::default()
        }],
    }
}
