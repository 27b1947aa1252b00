//! Mapping tables: the key → new value pairs that drive a run
//!
//! A table is read completely and validated before anything is sent to the
//! platform. Any defect in the file aborts the run with the offending line.

use crate::error::{ErrorCode, PolBatchError};
use clap::ValueEnum;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Delimited-text flavours accepted for input and written for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dialect {
    /// Comma separated, double-quote quoting
    #[default]
    Excel,
    /// Tab separated
    ExcelTab,
}

impl Dialect {
    pub fn delimiter(self) -> u8 {
        match self {
            Dialect::Excel => b',',
            Dialect::ExcelTab => b'\t',
        }
    }
}

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("cannot read input: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Csv {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("line {line}: '{key}' is mapped to '{second}' but was already mapped to '{first}'")]
    Conflict {
        line: u64,
        key: String,
        first: String,
        second: String,
    },

    #[error("no column named '{0}' in header")]
    UnknownColumn(String),

    #[error("input contains no entries")]
    Empty,
}

impl MappingError {
    pub fn line(&self) -> Option<u64> {
        match self {
            MappingError::Csv { line, .. }
            | MappingError::MalformedRow { line, .. }
            | MappingError::Conflict { line, .. } => Some(*line),
            _ => None,
        }
    }
}

impl From<MappingError> for PolBatchError {
    fn from(err: MappingError) -> Self {
        let code = match &err {
            MappingError::Io(_) => ErrorCode::INPUT_UNREADABLE,
            MappingError::Csv { .. } | MappingError::MalformedRow { .. } => {
                ErrorCode::INPUT_MALFORMED_ROW
            }
            MappingError::Conflict { .. } => ErrorCode::INPUT_CONFLICTING_KEY,
            MappingError::UnknownColumn(_) => ErrorCode::INPUT_UNKNOWN_COLUMN,
            MappingError::Empty => ErrorCode::INPUT_EMPTY,
        };
        PolBatchError::input_with_code(code, err.to_string(), err.line())
    }
}

/// Open the named file, or stdin when no path is given
pub fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, MappingError> {
    match path {
        Some(p) => Ok(Box::new(File::open(p)?)),
        None => Ok(Box::new(io::stdin())),
    }
}

fn reader_builder(dialect: Dialect, has_header: bool) -> ReaderBuilder {
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(dialect.delimiter())
        .has_headers(has_header)
        .flexible(true)
        .trim(Trim::All);
    builder
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingEntry {
    pub key: String,
    pub value: String,
    pub line: u64,
}

/// Ordered, immutable key → value table
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
    index: HashMap<String, usize>,
}

impl MappingTable {
    /// Read column 0 as key and column 1 as value.
    ///
    /// Extra columns are ignored. Repeating a row verbatim is harmless;
    /// mapping the same key to two values is an error.
    pub fn from_reader<R: Read>(
        reader: R,
        dialect: Dialect,
        has_header: bool,
    ) -> Result<Self, MappingError> {
        let mut csv = reader_builder(dialect, has_header).from_reader(reader);
        let mut table = MappingTable::default();

        for result in csv.records() {
            let record = result.map_err(|e| MappingError::Csv {
                line: e.position().map(|p| p.line()).unwrap_or(0),
                source: e,
            })?;
            let line = line_of(&record);
            if record.iter().all(str::is_empty) {
                continue;
            }

            let key = record.get(0).unwrap_or_default();
            let value = record.get(1).unwrap_or_default();
            if record.len() < 2 {
                return Err(MappingError::MalformedRow {
                    line,
                    reason: "expected two columns (key and new value)".to_string(),
                });
            }
            if key.is_empty() || value.is_empty() {
                return Err(MappingError::MalformedRow {
                    line,
                    reason: "key and new value must not be empty".to_string(),
                });
            }
            table.insert(key, value, line)?;
        }

        if table.entries.is_empty() {
            return Err(MappingError::Empty);
        }
        Ok(table)
    }

    pub fn from_path(
        path: Option<&Path>,
        dialect: Dialect,
        has_header: bool,
    ) -> Result<Self, MappingError> {
        Self::from_reader(open_input(path)?, dialect, has_header)
    }

    fn insert(&mut self, key: &str, value: &str, line: u64) -> Result<(), MappingError> {
        if let Some(&i) = self.index.get(key) {
            let existing = &self.entries[i];
            if existing.value == value {
                return Ok(());
            }
            return Err(MappingError::Conflict {
                line,
                key: key.to_string(),
                first: existing.value.clone(),
                second: value.to_string(),
            });
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push(MappingEntry {
            key: key.to_string(),
            value: value.to_string(),
            line,
        });
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index.get(key).map(|&i| self.entries[i].value.as_str())
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct new values, in first-seen order
    pub fn values(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .map(|e| e.value.as_str())
            .filter(|v| seen.insert(*v))
            .collect()
    }
}

/// Which column of a single-field list to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    Index(usize),
    Name(String),
}

impl FromStr for FieldSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(i) => FieldSelector::Index(i),
            Err(_) => FieldSelector::Name(s.trim().to_string()),
        })
    }
}

impl Default for FieldSelector {
    fn default() -> Self {
        FieldSelector::Index(0)
    }
}

/// Read one value per row, e.g. item barcodes.
///
/// Selecting by name implies a header row.
pub fn read_key_list<R: Read>(
    reader: R,
    dialect: Dialect,
    field: &FieldSelector,
    has_header: bool,
) -> Result<Vec<MappingEntry>, MappingError> {
    let by_name = matches!(field, FieldSelector::Name(_));
    let mut csv = reader_builder(dialect, has_header || by_name).from_reader(reader);

    let column = match field {
        FieldSelector::Index(i) => *i,
        FieldSelector::Name(name) => {
            let headers = csv.headers().map_err(|e| MappingError::Csv {
                line: 1,
                source: e,
            })?;
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| MappingError::UnknownColumn(name.clone()))?
        }
    };

    let mut keys = Vec::new();
    for result in csv.records() {
        let record = result.map_err(|e| MappingError::Csv {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            source: e,
        })?;
        let line = line_of(&record);
        if record.iter().all(str::is_empty) {
            continue;
        }
        match record.get(column) {
            Some(v) if !v.is_empty() => keys.push(MappingEntry {
                key: v.to_string(),
                value: String::new(),
                line,
            }),
            _ => {
                return Err(MappingError::MalformedRow {
                    line,
                    reason: format!("column {} is missing or empty", column),
                })
            }
        }
    }

    if keys.is_empty() {
        return Err(MappingError::Empty);
    }
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(input: &str) -> Result<MappingTable, MappingError> {
        MappingTable::from_reader(input.as_bytes(), Dialect::Excel, false)
    }

    #[test]
    fn test_reads_pairs_in_order() {
        let t = table("10001-1,HIST\n10002-1, ART \n\n10003-1,HIST,ignored\n").unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.get("10002-1"), Some("ART"));
        assert_eq!(t.entries()[2].key, "10003-1");
        assert_eq!(t.values(), vec!["HIST", "ART"]);
    }

    #[test]
    fn test_tab_dialect_with_header() {
        let t = MappingTable::from_reader(
            "pol\tfund\n1-1\tHIST\n".as_bytes(),
            Dialect::ExcelTab,
            true,
        )
        .unwrap();
        assert_eq!(t.get("1-1"), Some("HIST"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_single_column_row_is_malformed() {
        let err = table("1-1,HIST\n1-2\n").unwrap_err();
        assert!(matches!(err, MappingError::MalformedRow { line: 2, .. }));
    }

    #[test]
    fn test_empty_value_is_malformed() {
        let err = table("1-1,\n").unwrap_err();
        assert!(matches!(err, MappingError::MalformedRow { line: 1, .. }));
    }

    #[test]
    fn test_conflicting_key() {
        let err = table("1-1,HIST\n1-1,ART\n").unwrap_err();
        match err {
            MappingError::Conflict { line, key, first, second } => {
                assert_eq!(line, 2);
                assert_eq!(key, "1-1");
                assert_eq!(first, "HIST");
                assert_eq!(second, "ART");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exact_duplicate_collapses() {
        let t = table("1-1,HIST\n1-1,HIST\n").unwrap();
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(table("\n\n").unwrap_err(), MappingError::Empty));
    }

    #[test]
    fn test_conversion_to_fatal_error() {
        let err: PolBatchError = table("1-1\n").unwrap_err().into();
        assert_eq!(err.code(), ErrorCode::INPUT_MALFORMED_ROW);
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_key_list_by_index() {
        let keys = read_key_list(
            "x\t39015\n".as_bytes(),
            Dialect::ExcelTab,
            &FieldSelector::Index(1),
            false,
        )
        .unwrap();
        assert_eq!(keys[0].key, "39015");
    }

    #[test]
    fn test_key_list_by_name() {
        let field: FieldSelector = "barcode".parse().unwrap();
        let keys = read_key_list(
            "title,barcode\nA,111\nB,222\n".as_bytes(),
            Dialect::Excel,
            &field,
            false,
        )
        .unwrap();
        let values: Vec<_> = keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(values, vec!["111", "222"]);
    }

    #[test]
    fn test_key_list_unknown_column() {
        let field = FieldSelector::Name("barcode".into());
        let err = read_key_list("a,b\n1,2\n".as_bytes(), Dialect::Excel, &field, false)
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownColumn(_)));
    }

    #[test]
    fn test_field_selector_parse() {
        assert_eq!("2".parse::<FieldSelector>().unwrap(), FieldSelector::Index(2));
        assert_eq!(
            "barcode".parse::<FieldSelector>().unwrap(),
            FieldSelector::Name("barcode".into())
        );
    }
}
