//! Shared fixtures for the integration tests

#![allow(dead_code)]

use polbatch::folio::MockFolioClient;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

pub fn po_line(id: &str, number: &str, payment_status: &str, distributions: Value) -> Value {
    json!({
        "id": id,
        "poLineNumber": number,
        "orderFormat": "Electronic Resource",
        "paymentStatus": payment_status,
        "receiptStatus": "Pending",
        "cost": {"listUnitPriceElectronic": 40.0, "currency": "USD"},
        "fundDistribution": distributions,
    })
}

pub fn distribution(code: &str, fund_id: &str) -> Value {
    json!({
        "code": code,
        "fundId": fund_id,
        "distributionType": "percentage",
        "value": 100.0,
        "encumbrance": format!("enc-{}", fund_id),
        "expenseClassId": "ec-print",
    })
}

pub fn fund(id: &str, code: &str) -> Value {
    json!({"id": id, "code": code, "name": format!("{} fund", code), "fundStatus": "Active"})
}

/// Three open POLs on HIST and one fully paid one
pub async fn seeded_mock() -> MockFolioClient {
    let mock = MockFolioClient::new();
    for (id, number, payment) in [
        ("p1", "10001-1", "Awaiting Payment"),
        ("p2", "10002-1", "Awaiting Payment"),
        ("p3", "10003-1", "Fully Paid"),
        ("p4", "10004-1", "Awaiting Payment"),
    ] {
        mock.add_po_line(po_line(id, number, payment, json!([distribution("HIST", "f-hist")])))
            .await;
    }
    mock
}

/// Write a config file pointing at `url`
pub fn write_config(dir: &Path, url: &str) -> PathBuf {
    let path = dir.join("polbatch.toml");
    std::fs::write(
        &path,
        format!(
            "[okapi]\nurl = \"{}\"\ntenant_id = \"diku\"\nusername = \"batch\"\npassword = \"secret\"\n\n[http]\ntimeout_secs = 2\n",
            url
        ),
    )
    .unwrap();
    path
}
