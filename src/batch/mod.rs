//! Generic batch runner
//!
//! A job is a `RecordMutator`: given one work item it decides what to do
//! and does it, returning an `Outcome`. The runner walks the items in
//! order, writes one report row per item and keeps going when a single
//! record fails. Only fatal API errors (transport, authorization) and
//! report write failures stop it.

pub mod filter;
pub mod outcome;
pub mod report;

pub use filter::RecordFilter;
pub use outcome::{Outcome, OutcomeKind};
pub use report::{open_output, ReportWriter};

use crate::error::{PolBatchError, Result};
use crate::folio::{ApiError, FolioApi};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{error, info, warn};

#[async_trait]
pub trait RecordMutator: Send + Sync {
    type Item: Send + Sync;

    /// Short job name used in log lines
    fn name(&self) -> &'static str;

    /// Report key and target value for an item
    fn describe(&self, item: &Self::Item) -> (String, String);

    /// Process one item. `Err` means the call itself failed; the runner
    /// decides whether that ends the run or just this record.
    async fn apply(&self, api: &dyn FolioApi, item: &Self::Item) -> std::result::Result<Outcome, ApiError>;
}

/// Outcome counts for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub counts: BTreeMap<OutcomeKind, usize>,
}

impl RunSummary {
    pub fn record(&mut self, kind: OutcomeKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    pub fn count(&self, kind: OutcomeKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn needing_review(&self) -> usize {
        self.counts
            .iter()
            .filter(|(k, _)| k.needs_review())
            .map(|(_, n)| n)
            .sum()
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(kind, n)| format!("{} {}", n, kind))
            .collect();
        write!(f, "{} records: {}", self.total(), parts.join(", "))
    }
}

/// Run `mutator` over `items`, reporting every outcome
pub async fn run_batch<M, W>(
    api: &dyn FolioApi,
    mutator: &M,
    items: &[M::Item],
    report: &mut ReportWriter<W>,
) -> Result<RunSummary>
where
    M: RecordMutator,
    W: Write,
{
    let mut summary = RunSummary::default();
    info!("{}: processing {} entries", mutator.name(), items.len());

    for item in items {
        let (key, new_value) = mutator.describe(item);
        let outcome = match mutator.apply(api, item).await {
            Ok(outcome) => outcome,
            Err(e) if e.is_fatal() => {
                error!("{}: aborting at {}: {}", mutator.name(), key, e);
                return Err(PolBatchError::from(e).with_context(format!("while processing {}", key)));
            }
            Err(e) => Outcome::failed(e.status(), e.to_string()),
        };

        match outcome.kind {
            OutcomeKind::Failed | OutcomeKind::ManualReview => {
                warn!("{} -> {}: {}", key, outcome.kind, outcome.message)
            }
            _ => info!("{} -> {} {}", key, outcome.kind, outcome.message),
        }
        report.write(&key, &new_value, &outcome)?;
        summary.record(outcome.kind);
    }

    info!("{}: {}", mutator.name(), summary);
    Ok(summary)
}
