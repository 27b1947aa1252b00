//! CLI argument structures
//!
//! The main `Cli` structure and one subcommand per batch job. Arguments
//! shared by the jobs live in flattened groups.

use crate::batch::RecordFilter;
use crate::mapping::{Dialect, FieldSelector};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Bulk edits of purchase order lines and items through the Okapi API
#[derive(Parser)]
#[command(name = "polbatch")]
#[command(about = "polbatch - batch updates for FOLIO purchase order lines", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Configuration file (default: ./polbatch.toml, then the user config dir)
    #[arg(short = 'C', long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Input, output and write switches common to every job
#[derive(Args, Debug, Clone)]
pub struct IoArgs {
    /// Input file (default: stdin)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub infile: Option<PathBuf>,

    /// Report file, truncated if it exists (default: stdout)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub outfile: Option<PathBuf>,

    /// Delimiter dialect of the input file
    #[arg(long, value_enum, default_value = "excel")]
    pub in_dialect: Dialect,

    /// Delimiter dialect of the report
    #[arg(long, value_enum, default_value = "excel")]
    pub out_dialect: Dialect,

    /// Skip the first input row
    #[arg(long)]
    pub header: bool,

    /// Compute every change but write nothing
    #[arg(long)]
    pub dry_run: bool,
}

/// Restrict which POLs may be changed
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only touch POLs with this payment status (repeatable)
    #[arg(long = "payment-status", value_name = "STATUS")]
    pub payment_status: Vec<String>,

    /// Only touch POLs with this receipt status (repeatable)
    #[arg(long = "receipt-status", value_name = "STATUS")]
    pub receipt_status: Vec<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> RecordFilter {
        RecordFilter {
            payment_statuses: self.payment_status.clone(),
            receipt_statuses: self.receipt_status.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set the fund code on every fund distribution (rows: POL number, fund code)
    #[command(name = "set-fund")]
    SetFund {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Release the encumbrance and re-encumber on a new fund (rows: POL number, fund code)
    #[command(name = "move-fund")]
    MoveFund {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filter: FilterArgs,

        /// Fiscal year code (default: the fiscal year covering today)
        #[arg(long, value_name = "CODE")]
        fiscal_year: Option<String>,
    },

    /// Remap fund codes on all POLs carrying them (rows: old code, new code)
    #[command(name = "remap-fund")]
    RemapFund {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Reset the expense class of POL fund distributions (rows: POL number, expense class)
    #[command(name = "expense-class")]
    ExpenseClass {
        #[command(flatten)]
        io: IoArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Remove the permanent location from items listed by barcode
    #[command(name = "clear-location")]
    ClearLocation {
        #[command(flatten)]
        io: IoArgs,

        /// Barcode column: zero-based index or header name
        #[arg(long, default_value = "0", value_name = "FIELD")]
        barcode_field: FieldSelector,
    },

    /// Print the expense classes of the tenant as id, code and name
    #[command(name = "expense-classes")]
    ExpenseClasses {
        /// Output file (default: stdout)
        #[arg(short = 'o', long, value_name = "FILE")]
        outfile: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_move_fund() {
        let cli = Cli::try_parse_from([
            "polbatch",
            "-vv",
            "move-fund",
            "-i",
            "moves.tsv",
            "--in-dialect",
            "excel-tab",
            "--fiscal-year",
            "FY2024",
            "--payment-status",
            "Awaiting Payment",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::MoveFund { io, filter, fiscal_year } => {
                assert_eq!(io.infile, Some(PathBuf::from("moves.tsv")));
                assert_eq!(io.in_dialect, Dialect::ExcelTab);
                assert_eq!(io.out_dialect, Dialect::Excel);
                assert!(io.dry_run);
                assert_eq!(fiscal_year.as_deref(), Some("FY2024"));
                assert_eq!(filter.to_filter().payment_statuses, vec!["Awaiting Payment"]);
            }
            _ => panic!("expected move-fund"),
        }
    }

    #[test]
    fn test_barcode_field_by_name() {
        let cli = Cli::try_parse_from(["polbatch", "clear-location", "--barcode-field", "Barcode"])
            .unwrap();
        match cli.command {
            Commands::ClearLocation { barcode_field, .. } => {
                assert_eq!(barcode_field, FieldSelector::Name("Barcode".into()));
            }
            _ => panic!("expected clear-location"),
        }
    }
}
