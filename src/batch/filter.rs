use crate::folio::query;
use crate::model::PurchaseOrderLine;

/// Restricts which POLs a run may touch.
///
/// Empty sets accept everything. Comparisons ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub payment_statuses: Vec<String>,
    pub receipt_statuses: Vec<String>,
}

fn accepts(allowed: &[String], actual: Option<&str>) -> bool {
    allowed.is_empty()
        || actual.is_some_and(|a| allowed.iter().any(|s| s.eq_ignore_ascii_case(a)))
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.payment_statuses.is_empty() && self.receipt_statuses.is_empty()
    }

    /// Why the POL is excluded, or `None` if it passes
    pub fn rejection(&self, pol: &PurchaseOrderLine) -> Option<String> {
        if !accepts(&self.payment_statuses, pol.payment_status.as_deref()) {
            return Some(format!(
                "payment status '{}' not selected",
                pol.payment_status.as_deref().unwrap_or("")
            ));
        }
        if !accepts(&self.receipt_statuses, pol.receipt_status.as_deref()) {
            return Some(format!(
                "receipt status '{}' not selected",
                pol.receipt_status.as_deref().unwrap_or("")
            ));
        }
        None
    }

    /// The same constraints as CQL clauses, for query-driven selection
    pub fn cql_clauses(&self) -> Vec<Option<String>> {
        vec![
            query::any_of("paymentStatus", &self.payment_statuses),
            query::any_of("receiptStatus", &self.receipt_statuses),
        ]
    }
}
