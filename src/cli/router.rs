//! Command routing and execution
//!
//! Routes each parsed subcommand to its handler.

use crate::app::AppConfig;
use crate::cli::args::Commands;
use crate::cli::commands::*;
use anyhow::Result;

/// Execute a CLI command based on the parsed arguments
pub async fn execute_command(command: Commands, config: &AppConfig) -> Result<()> {
    let config_path = config.config_path.as_deref();
    match command {
        Commands::SetFund { io, filter } => run_set_fund(config_path, io, filter).await,
        Commands::MoveFund {
            io,
            filter,
            fiscal_year,
        } => run_move_fund(config_path, io, filter, fiscal_year).await,
        Commands::RemapFund { io, filter } => run_remap_fund(config_path, io, filter).await,
        Commands::ExpenseClass { io, filter } => run_expense_class(config_path, io, filter).await,
        Commands::ClearLocation { io, barcode_field } => {
            run_clear_location(config_path, io, barcode_field).await
        }
        Commands::ExpenseClasses { outfile } => run_expense_classes(config_path, outfile).await,
    }
}
