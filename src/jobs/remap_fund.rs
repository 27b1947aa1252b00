//! Query-driven remap of fund codes across all matching POLs

use super::{distributions_json, log_distributions, put_po_line, write_outcome, JobOptions};
use crate::batch::{Outcome, RecordMutator};
use crate::error::{ErrorCode, PolBatchError, Result};
use crate::finance::FundIndex;
use crate::folio::{query, ApiError, FolioApi, PO_LINES_PATH};
use crate::mapping::MappingTable;
use crate::model::PurchaseOrderLine;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, info};

/// Rows are `old fund code → new fund code`.
///
/// Selection happens up front with one query per old code; each selected POL
/// is then one work item.
pub struct RemapFund {
    mapping: MappingTable,
    funds: FundIndex,
    options: JobOptions,
}

impl RemapFund {
    /// Every new code must name an existing fund, and no new code may also
    /// be an old one, so a second run never moves a record again.
    pub fn new(mapping: MappingTable, funds: FundIndex, options: JobOptions) -> Result<Self> {
        funds.require_all(mapping.values())?;
        for entry in mapping.entries() {
            if entry.value != entry.key && mapping.get(&entry.value).is_some() {
                return Err(PolBatchError::input_with_code(
                    ErrorCode::INPUT_CONFLICTING_KEY,
                    format!(
                        "'{}' is mapped to '{}', which is itself remapped",
                        entry.key, entry.value
                    ),
                    Some(entry.line),
                ));
            }
        }
        Ok(Self {
            mapping,
            funds,
            options,
        })
    }

    fn query_for(&self, old_code: &str) -> String {
        let mut clauses = vec![Some(query::po_lines_with_fund_code(old_code))];
        clauses.extend(self.options.filter.cql_clauses());
        query::and_all(clauses)
    }

    /// Every POL carrying at least one old code, each listed once.
    ///
    /// Records stay raw here; one that does not decode as a POL is reported
    /// on its own row when it is applied.
    pub async fn select(&self, api: &dyn FolioApi) -> Result<Vec<Value>> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();
        for entry in self.mapping.entries() {
            let cql = self.query_for(&entry.key);
            let records = api.get_all(PO_LINES_PATH, "poLines", Some(&cql)).await?;
            debug!("{} POL(s) on fund {}", records.len(), entry.key);
            for record in records {
                let first_sighting = match record_id(&record) {
                    Some(id) => seen.insert(id.to_string()),
                    None => true,
                };
                if first_sighting {
                    selected.push(record);
                }
            }
        }
        info!("Selected {} POL(s) for remapping", selected.len());
        Ok(selected)
    }

    /// New codes for the given current codes, in first-seen order
    fn new_codes<'c>(&self, current: impl IntoIterator<Item = &'c str>) -> Vec<&str> {
        let mut seen = HashSet::new();
        current
            .into_iter()
            .filter_map(|code| self.mapping.get(code))
            .filter(|code| seen.insert(*code))
            .collect()
    }

    async fn remap(
        &self,
        api: &dyn FolioApi,
        pol: PurchaseOrderLine,
    ) -> std::result::Result<Outcome, ApiError> {
        if let Some(reason) = self.options.filter.rejection(&pol) {
            return Ok(Outcome::skipped(reason).with_record(&pol.id));
        }

        let mut updated = pol.clone();
        let mut changed = 0;
        for dist in updated.fund_distribution.iter_mut().flatten() {
            let Some(new_code) = self.mapping.get(&dist.code) else {
                continue;
            };
            let Some(fund) = self.funds.get(new_code) else {
                continue;
            };
            if dist.code != fund.code || dist.fund_id != fund.id {
                dist.code = fund.code.clone();
                dist.fund_id = fund.id.clone();
                changed += 1;
            }
        }
        if changed == 0 {
            return Ok(Outcome::unchanged("no distribution on a remapped fund").with_record(&pol.id));
        }

        let original = distributions_json(pol.distributions());
        log_distributions("original", pol.distributions());
        log_distributions("updated", updated.distributions());

        if self.options.dry_run {
            return Ok(Outcome::dry_run(format!("would remap {} distribution(s)", changed))
                .with_record(&pol.id)
                .with_original(original));
        }

        let response = put_po_line(api, &updated).await?;
        Ok(write_outcome(&response)
            .with_record(&pol.id)
            .with_original(original))
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

/// Fund codes on a raw POL, whatever else is wrong with it
fn raw_fund_codes(record: &Value) -> Vec<&str> {
    record
        .get("fundDistribution")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|d| d.get("code").and_then(Value::as_str))
        .collect()
}

#[async_trait]
impl RecordMutator for RemapFund {
    type Item = Value;

    fn name(&self) -> &'static str {
        "remap-fund"
    }

    fn describe(&self, record: &Value) -> (String, String) {
        let key = record
            .get("poLineNumber")
            .and_then(Value::as_str)
            .or_else(|| record_id(record))
            .unwrap_or_default();
        (key.to_string(), self.new_codes(raw_fund_codes(record)).join(" "))
    }

    async fn apply(&self, api: &dyn FolioApi, record: &Value) -> std::result::Result<Outcome, ApiError> {
        match serde_json::from_value::<PurchaseOrderLine>(record.clone()) {
            Ok(pol) => self.remap(api, pol).await,
            Err(e) => {
                let outcome = Outcome::failed(None, format!("malformed POL: {}", e));
                Ok(match record_id(record) {
                    Some(id) => outcome.with_record(id),
                    None => outcome,
                })
            }
        }
    }
}
