use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    Updated,
    Unchanged,
    Skipped,
    DryRun,
    ManualReview,
    Failed,
}

impl OutcomeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutcomeKind::Updated => "updated",
            OutcomeKind::Unchanged => "unchanged",
            OutcomeKind::Skipped => "skipped",
            OutcomeKind::DryRun => "dry-run",
            OutcomeKind::ManualReview => "manual-review",
            OutcomeKind::Failed => "failed",
        }
    }

    /// Rows a person has to look at after the run
    pub fn needs_review(self) -> bool {
        matches!(self, OutcomeKind::ManualReview | OutcomeKind::Failed)
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one input entry
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub record_id: Option<String>,
    pub status_code: Option<u16>,
    pub message: String,
    pub original: Option<String>,
}

impl Outcome {
    fn new(kind: OutcomeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            record_id: None,
            status_code: None,
            message: message.into(),
            original: None,
        }
    }

    pub fn updated(status: u16, message: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Updated, message).with_status(status)
    }

    pub fn unchanged(message: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Unchanged, message)
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::new(OutcomeKind::Skipped, reason)
    }

    pub fn dry_run(message: impl Into<String>) -> Self {
        Self::new(OutcomeKind::DryRun, message)
    }

    pub fn manual_review(reason: impl Into<String>) -> Self {
        Self::new(OutcomeKind::ManualReview, reason)
    }

    pub fn failed(status: Option<u16>, message: impl Into<String>) -> Self {
        let mut outcome = Self::new(OutcomeKind::Failed, message);
        outcome.status_code = status;
        outcome
    }

    pub fn with_record(mut self, id: impl Into<String>) -> Self {
        self.record_id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original = Some(original.into());
        self
    }
}
