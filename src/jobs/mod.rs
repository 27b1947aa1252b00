//! The batch jobs, one `RecordMutator` each
//!
//! - `set_fund` - plain fund code swap on every distribution of a POL
//! - `move_fund` - release the POL's encumbrance and re-encumber on a new fund
//! - `remap_fund` - query-driven old → new fund code remap
//! - `expense_class` - reset expense classes by stripping and restoring distributions
//! - `clear_location` - drop the permanent location from inventory items

pub mod clear_location;
pub mod expense_class;
pub mod move_fund;
pub mod remap_fund;
pub mod set_fund;

pub use clear_location::ClearLocation;
pub use expense_class::ResetExpenseClass;
pub use move_fund::MoveFund;
pub use remap_fund::RemapFund;
pub use set_fund::SetFund;

use crate::batch::{Outcome, RecordFilter};
use crate::folio::{po_line_path, query, ApiError, ApiResponse, FolioApi, PO_LINES_PATH};
use crate::model::{FundDistribution, PurchaseOrderLine};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Switches shared by every job
#[derive(Debug, Clone, Default)]
pub struct JobOptions {
    pub dry_run: bool,
    pub filter: RecordFilter,
}

/// Result of a lookup that should match exactly one record
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Ambiguous(u64),
}

pub async fn find_unique<T: DeserializeOwned>(
    api: &dyn FolioApi,
    path: &str,
    key: &str,
    cql: &str,
) -> Result<Lookup<T>, ApiError> {
    let page = api.get_json(path, Some(cql)).await?;
    let total = page.get("totalRecords").and_then(Value::as_u64).unwrap_or(0);
    match total {
        0 => Ok(Lookup::NotFound),
        1 => {
            let first = page
                .get(key)
                .and_then(Value::as_array)
                .and_then(|records| records.first())
                .cloned()
                .ok_or_else(|| ApiError::Decode(format!("'{}' missing from response", key)))?;
            Ok(Lookup::Found(from_json(first)?))
        }
        n => Ok(Lookup::Ambiguous(n)),
    }
}

pub async fn find_po_line(
    api: &dyn FolioApi,
    po_line_number: &str,
) -> Result<Lookup<PurchaseOrderLine>, ApiError> {
    find_unique(api, PO_LINES_PATH, "poLines", &query::po_line_by_number(po_line_number)).await
}

/// Look up the POL for an input row and apply the filter.
///
/// The inner `Err` is the outcome to report when the row cannot proceed.
pub async fn load_target(
    api: &dyn FolioApi,
    po_line_number: &str,
    filter: &RecordFilter,
) -> Result<Result<PurchaseOrderLine, Outcome>, ApiError> {
    let pol = match find_po_line(api, po_line_number).await? {
        Lookup::Found(pol) => pol,
        Lookup::NotFound => {
            return Ok(Err(Outcome::manual_review(format!(
                "No POL found for line number '{}'",
                po_line_number
            ))))
        }
        Lookup::Ambiguous(n) => {
            return Ok(Err(Outcome::manual_review(format!(
                "query for POL number {} returned {} results, should be unique",
                po_line_number, n
            ))))
        }
    };

    if let Some(reason) = filter.rejection(&pol) {
        return Ok(Err(Outcome::skipped(reason).with_record(pol.id)));
    }
    Ok(Ok(pol))
}

pub async fn put_po_line(
    api: &dyn FolioApi,
    pol: &PurchaseOrderLine,
) -> Result<ApiResponse, ApiError> {
    api.put_json(&po_line_path(&pol.id), &to_json(pol)?).await
}

pub fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

pub fn from_json<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Compact JSON of a fund distribution list, for the report
pub fn distributions_json(distributions: &[FundDistribution]) -> String {
    serde_json::to_string(distributions).unwrap_or_default()
}

pub fn log_distributions(label: &str, distributions: &[FundDistribution]) {
    debug!(
        "{} fund distribution:\n{}",
        label,
        serde_json::to_string_pretty(distributions).unwrap_or_default()
    );
}

/// Turn the response of the final write into an outcome
pub fn write_outcome(response: &ApiResponse) -> Outcome {
    if response.is_success() {
        Outcome::updated(response.status, response.body.trim())
    } else {
        Outcome::failed(Some(response.status), response.body.trim())
    }
}
