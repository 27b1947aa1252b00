//! Per-record outcome report, one delimited row per input entry

use super::outcome::{Outcome, OutcomeKind};
use crate::error::{common, Result};
use crate::mapping::Dialect;
use chrono::{SecondsFormat, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

pub const REPORT_COLUMNS: [&str; 9] = [
    "timestamp",
    "key",
    "new_value",
    "record_id",
    "outcome",
    "status_code",
    "message",
    "original",
    "manual_review",
];

#[derive(Debug, Serialize)]
pub struct ReportRow<'a> {
    pub timestamp: String,
    pub key: &'a str,
    pub new_value: &'a str,
    pub record_id: Option<&'a str>,
    pub outcome: OutcomeKind,
    pub status_code: Option<u16>,
    pub message: &'a str,
    pub original: Option<&'a str>,
    pub manual_review: &'static str,
}

/// Open the named file (truncating it), or stdout
pub fn open_output(path: Option<&Path>) -> io::Result<Box<dyn Write>> {
    match path {
        Some(p) => Ok(Box::new(File::create(p)?)),
        None => Ok(Box::new(io::stdout())),
    }
}

pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    /// Create the writer and emit the header row right away
    pub fn new(inner: W, dialect: Dialect) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .delimiter(dialect.delimiter())
            .has_headers(false)
            .from_writer(inner);
        writer
            .write_record(REPORT_COLUMNS)
            .map_err(common::unwritable_report)?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, key: &str, new_value: &str, outcome: &Outcome) -> Result<()> {
        let row = ReportRow {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            key,
            new_value,
            record_id: outcome.record_id.as_deref(),
            outcome: outcome.kind,
            status_code: outcome.status_code,
            message: &outcome.message,
            original: outcome.original.as_deref(),
            manual_review: if outcome.kind.needs_review() { "Y" } else { "N" },
        };
        self.writer.serialize(row).map_err(common::unwritable_report)?;
        // flushed per row so a killed run still leaves a usable report
        self.writer.flush().map_err(common::unwritable_report)
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| common::unwritable_report(e.into_error()))
    }
}
