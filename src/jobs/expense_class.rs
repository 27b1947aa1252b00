//! Reset the expense class on POL fund distributions
//!
//! Changing the expense class of an encumbered distribution in place is
//! rejected by the orders module, so the distributions are removed with one
//! PUT and written back with the new class and fresh encumbrance ids with a
//! second one.

use super::{
    distributions_json, load_target, log_distributions, put_po_line, write_outcome, JobOptions,
};
use crate::batch::{Outcome, RecordMutator};
use crate::finance::ExpenseClassIndex;
use crate::folio::{ApiError, FolioApi};
use crate::mapping::MappingEntry;
use crate::model::PurchaseOrderLine;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Rows are `POL number → expense class code` (or name)
pub struct ResetExpenseClass {
    classes: ExpenseClassIndex,
    options: JobOptions,
}

impl ResetExpenseClass {
    pub fn new(classes: ExpenseClassIndex, options: JobOptions) -> Self {
        Self { classes, options }
    }

    /// Codes then names of the classes currently on the POL
    fn describe_current(&self, pol: &PurchaseOrderLine) -> String {
        let current: Vec<_> = pol
            .distributions()
            .iter()
            .filter_map(|d| d.expense_class_id.as_deref())
            .map(|id| self.classes.by_id(id))
            .collect();
        let codes: Vec<&str> = current
            .iter()
            .map(|ec| ec.map_or("?", |ec| ec.code.as_str()))
            .collect();
        let names: Vec<&str> = current
            .iter()
            .map(|ec| ec.map_or("?", |ec| ec.name.as_str()))
            .collect();
        format!("{} | {}", codes.join(" "), names.join(" "))
    }
}

#[async_trait]
impl RecordMutator for ResetExpenseClass {
    type Item = MappingEntry;

    fn name(&self) -> &'static str {
        "expense-class"
    }

    fn describe(&self, entry: &MappingEntry) -> (String, String) {
        (entry.key.clone(), entry.value.clone())
    }

    async fn apply(&self, api: &dyn FolioApi, entry: &MappingEntry) -> Result<Outcome, ApiError> {
        let Some(class) = self.classes.resolve(&entry.value) else {
            return Ok(Outcome::manual_review(format!(
                "expense class '{}' does not exist",
                entry.value
            )));
        };

        let pol = match load_target(api, &entry.key, &self.options.filter).await? {
            Ok(pol) => pol,
            Err(outcome) => return Ok(outcome),
        };

        let distributions = pol.distributions();
        if distributions.is_empty() {
            return Ok(Outcome::manual_review("POL has 0 fund distributions").with_record(&pol.id));
        }
        if let Some(bare) = distributions.iter().find(|d| d.expense_class_id.is_none()) {
            return Ok(Outcome::manual_review(format!(
                "fund distribution has no expenseClassId: {}",
                distributions_json(std::slice::from_ref(bare))
            ))
            .with_record(&pol.id));
        }
        if distributions
            .iter()
            .all(|d| d.expense_class_id.as_deref() == Some(class.id.as_str()))
        {
            return Ok(Outcome::unchanged(format!("already on expense class {}", class.code))
                .with_record(&pol.id));
        }
        let original = self.describe_current(&pol);

        let mut restored = pol.clone();
        for dist in restored.fund_distribution.iter_mut().flatten() {
            dist.expense_class_id = Some(class.id.clone());
            dist.encumbrance = Some(Uuid::new_v4().to_string());
        }
        log_distributions("original", distributions);
        log_distributions("updated", restored.distributions());

        if self.options.dry_run {
            return Ok(Outcome::dry_run(format!(
                "would reset {} distribution(s) to {}",
                distributions.len(),
                class.code
            ))
            .with_record(&pol.id)
            .with_original(original));
        }

        let stripped = PurchaseOrderLine {
            fund_distribution: None,
            ..pol.clone()
        };
        debug!("Removing fund distribution from POL {}", pol.id);
        let response = put_po_line(api, &stripped).await?;
        if !response.is_success() {
            return Ok(Outcome::failed(
                Some(response.status),
                format!("failed to remove fund distribution: {}", response.body.trim()),
            )
            .with_record(&pol.id)
            .with_original(original));
        }

        let response = put_po_line(api, &restored).await?;
        let outcome = write_outcome(&response).with_record(&pol.id);
        if response.is_success() {
            Ok(outcome.with_original(original))
        } else {
            // the POL is now without distributions; keep them in the report
            Ok(outcome.with_original(distributions_json(distributions)))
        }
    }
}
