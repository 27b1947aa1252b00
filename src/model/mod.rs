//! Records exchanged with the platform
//!
//! Only the attributes the batch jobs read or change are typed. Everything
//! else is captured in a flattened map and written back as it came, so a
//! PUT never drops fields this tool does not know about.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A purchase order line (`/orders/order-lines`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOrderLine {
    pub id: String,
    #[serde(default)]
    pub po_line_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund_distribution: Option<Vec<FundDistribution>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PurchaseOrderLine {
    pub fn distributions(&self) -> &[FundDistribution] {
        self.fund_distribution.as_deref().unwrap_or(&[])
    }

    pub fn fund_codes(&self) -> Vec<&str> {
        self.distributions().iter().map(|d| d.code.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundDistribution {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub fund_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_class_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encumbrance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseClass {
    pub id: String,
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FiscalYear {
    pub id: String,
    pub code: String,
    pub period_start: String,
    pub period_end: String,
}

impl FiscalYear {
    /// Whether `day` falls inside the fiscal year.
    ///
    /// Period bounds are ISO timestamps but apply to whole days; consecutive
    /// years can leave a gap of a day between them, so a date may match none.
    pub fn covers(&self, day: NaiveDate) -> bool {
        match (date_part(&self.period_start), date_part(&self.period_end)) {
            (Some(start), Some(end)) => start <= day && day <= end,
            _ => false,
        }
    }
}

fn date_part(timestamp: &str) -> Option<NaiveDate> {
    timestamp
        .get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// A finance transaction; only encumbrances are queried
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(default)]
    pub fiscal_year_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub encumbrance: Option<EncumbranceDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncumbranceDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub source_po_line_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let raw = json!({
            "id": "pol-1",
            "poLineNumber": "10001-1",
            "orderFormat": "Physical Resource",
            "cost": {"listUnitPrice": 12.5, "currency": "USD"},
            "fundDistribution": [{
                "code": "HIST",
                "fundId": "f-1",
                "distributionType": "percentage",
                "value": 100.0,
                "encumbrance": "enc-1",
                "expenseClassId": "ec-1"
            }]
        });
        let pol: PurchaseOrderLine = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(pol.fund_codes(), vec!["HIST"]);
        assert_eq!(serde_json::to_value(&pol).unwrap(), raw);
    }

    #[test]
    fn test_missing_fund_distribution() {
        let pol: PurchaseOrderLine =
            serde_json::from_value(json!({"id": "p", "poLineNumber": "1-1"})).unwrap();
        assert!(pol.distributions().is_empty());
        let back = serde_json::to_value(&pol).unwrap();
        assert!(back.get("fundDistribution").is_none());
    }

    #[test]
    fn test_fiscal_year_covers_whole_days() {
        let fy = FiscalYear {
            id: "fy".into(),
            code: "FY2023".into(),
            period_start: "2022-06-26T00:00:00.000+00:00".into(),
            period_end: "2023-06-30T00:00:00.000+00:00".into(),
        };
        let day = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert!(fy.covers(day("2022-06-26")));
        assert!(fy.covers(day("2023-06-30")));
        assert!(!fy.covers(day("2022-06-25")));
        assert!(!fy.covers(day("2023-07-01")));
    }
}
