//! # polbatch
//!
//! Batch edits of purchase order lines and inventory items in FOLIO, driven
//! by a delimited mapping file and performed through the Okapi gateway.
//!
//! ## Usage
//!
//! ```bash
//! polbatch set-fund -i pol-funds.csv -o report.csv
//! polbatch move-fund --fiscal-year FY2024 -i moves.tsv --in-dialect excel-tab
//! polbatch remap-fund -i old-to-new.csv --payment-status "Awaiting Payment"
//! polbatch expense-class -i classes.csv --dry-run
//! polbatch clear-location -i items.csv --barcode-field Barcode
//! polbatch expense-classes
//! ```
//!
//! ## Modules
//!
//! - `app` - Logging setup and fatal error exit codes
//! - `batch` - The record-by-record runner, outcomes, filter and report
//! - `cli` - Argument parsing and subcommand handlers
//! - `config` - Connection settings from TOML and the environment
//! - `error` - Coded error types shared by every module
//! - `finance` - Funds, expense classes and fiscal years
//! - `folio` - The API seam, its HTTP client and an in-memory mock
//! - `jobs` - One record mutator per subcommand
//! - `mapping` - Mapping tables and key lists read from CSV/TSV
//! - `model` - Serde types for the records being edited
pub mod app;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod finance;
pub mod folio;
pub mod jobs;
pub mod mapping;
pub mod model;
