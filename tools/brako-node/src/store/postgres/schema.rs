/// Tables are created on startup if missing. There is no migration history;
/// column changes need a manual `ALTER TABLE`.
pub const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS contacts (
    id          BIGSERIAL PRIMARY KEY,
    name        TEXT NOT NULL,
    phone       TEXT NOT NULL DEFAULT '',
    country     TEXT NOT NULL DEFAULT '',
    city        TEXT NOT NULL DEFAULT '',
    address     TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS shipments (
    id              BIGSERIAL PRIMARY KEY,
    shipment_number TEXT NOT NULL,
    invoice_number  TEXT NOT NULL DEFAULT '',
    date            DATE NOT NULL,
    time            TIME NOT NULL,
    branch          TEXT NOT NULL,
    shipping_type   TEXT NOT NULL,
    sender_id       BIGINT NOT NULL REFERENCES contacts (id),
    receiver_id     BIGINT NOT NULL REFERENCES contacts (id),
    payment_method  TEXT NOT NULL,
    insurance       BOOLEAN NOT NULL DEFAULT FALSE,
    insurance_cost  NUMERIC NOT NULL DEFAULT 0,
    packaging       BOOLEAN NOT NULL DEFAULT FALSE,
    packaging_cost  NUMERIC NOT NULL DEFAULT 0,
    quantity        BIGINT NOT NULL,
    unit_price      NUMERIC NOT NULL,
    weight          NUMERIC NOT NULL,
    item_type       TEXT NOT NULL DEFAULT '',
    contents        TEXT NOT NULL DEFAULT '',
    final_price     NUMERIC NOT NULL,
    currency        TEXT NOT NULL,
    status          TEXT NOT NULL,
    tracking_code   TEXT NOT NULL UNIQUE,
    CHECK (sender_id <> receiver_id)
);

CREATE TABLE IF NOT EXISTS status_updates (
    id          BIGSERIAL PRIMARY KEY,
    shipment_id BIGINT NOT NULL REFERENCES shipments (id),
    status      TEXT NOT NULL,
    city        TEXT NOT NULL DEFAULT '',
    notes       TEXT NOT NULL DEFAULT '',
    date        DATE NOT NULL,
    time        TIME NOT NULL
);

CREATE INDEX IF NOT EXISTS status_updates_shipment_idx
    ON status_updates (shipment_id, id);
"#;
