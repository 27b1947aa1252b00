//! Swap the fund code on every fund distribution of a POL

use super::{
    distributions_json, load_target, log_distributions, put_po_line, write_outcome, JobOptions,
};
use crate::batch::{Outcome, RecordMutator};
use crate::folio::{ApiError, FolioApi};
use crate::mapping::MappingEntry;
use async_trait::async_trait;

/// Rows are `POL number → fund code`. Only `code` changes; the fund id is
/// left for the platform to resolve.
pub struct SetFund {
    pub options: JobOptions,
}

impl SetFund {
    pub fn new(options: JobOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl RecordMutator for SetFund {
    type Item = MappingEntry;

    fn name(&self) -> &'static str {
        "set-fund"
    }

    fn describe(&self, entry: &MappingEntry) -> (String, String) {
        (entry.key.clone(), entry.value.clone())
    }

    async fn apply(&self, api: &dyn FolioApi, entry: &MappingEntry) -> Result<Outcome, ApiError> {
        let pol = match load_target(api, &entry.key, &self.options.filter).await? {
            Ok(pol) => pol,
            Err(outcome) => return Ok(outcome),
        };

        if pol.distributions().is_empty() {
            return Ok(Outcome::manual_review("POL has 0 fund distributions").with_record(&pol.id));
        }
        if pol.distributions().iter().all(|d| d.code == entry.value) {
            return Ok(Outcome::unchanged(format!("already on fund {}", entry.value))
                .with_record(&pol.id));
        }

        let original = distributions_json(pol.distributions());
        let mut updated = pol.clone();
        for dist in updated.fund_distribution.iter_mut().flatten() {
            dist.code = entry.value.clone();
        }
        log_distributions("original", pol.distributions());
        log_distributions("updated", updated.distributions());

        if self.options.dry_run {
            return Ok(Outcome::dry_run(format!(
                "would set fund {} on {} distribution(s)",
                entry.value,
                updated.distributions().len()
            ))
            .with_record(&pol.id)
            .with_original(original));
        }

        let response = put_po_line(api, &updated).await?;
        Ok(write_outcome(&response)
            .with_record(&pol.id)
            .with_original(original))
    }
}
