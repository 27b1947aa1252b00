//! Handlers for the batch subcommands.
//!
//! Every handler follows the same order: resolve settings, read and validate
//! the input, log in, load reference data, run, report. Nothing reaches the
//! network before the input has been read completely.

use crate::batch::{open_output, run_batch, RecordMutator, ReportWriter, RunSummary};
use crate::cli::args::{FilterArgs, IoArgs};
use crate::config::{Config, OkapiSettings};
use crate::error::{common, PolBatchError};
use crate::finance::{find_fiscal_year, ExpenseClassIndex, FundIndex};
use crate::folio::{FolioApi, OkapiClient};
use crate::jobs::{ClearLocation, JobOptions, MoveFund, RemapFund, ResetExpenseClass, SetFund};
use crate::mapping::{open_input, read_key_list, FieldSelector, MappingTable};
use anyhow::Result;
use chrono::Local;
use std::path::Path;
use tracing::{info, warn};

/// Load the config file and environment into client settings
pub fn load_settings(config_path: Option<&Path>) -> Result<OkapiSettings> {
    let settings = Config::load(config_path)?.resolve()?;
    Ok(settings)
}

fn read_mapping(io: &IoArgs) -> Result<MappingTable> {
    let table = MappingTable::from_path(io.infile.as_deref(), io.in_dialect, io.header)
        .map_err(PolBatchError::from)?;
    info!("Read {} mapping entries", table.len());
    Ok(table)
}

fn job_options(io: &IoArgs, filter: &FilterArgs) -> JobOptions {
    if io.dry_run {
        info!("Dry run: no records will be written");
    }
    let filter = filter.to_filter();
    if !filter.is_empty() {
        info!(
            "Only POLs with payment status {:?} and receipt status {:?} (empty means any)",
            filter.payment_statuses, filter.receipt_statuses
        );
    }
    JobOptions {
        dry_run: io.dry_run,
        filter,
    }
}

/// Run `job` over `items` and write the report to the chosen output
pub async fn run_and_report<M: RecordMutator>(
    api: &dyn FolioApi,
    job: &M,
    items: &[M::Item],
    io: &IoArgs,
) -> Result<RunSummary> {
    let output = open_output(io.outfile.as_deref()).map_err(common::unwritable_report)?;
    let mut report = ReportWriter::new(output, io.out_dialect)?;
    let summary = run_batch(api, job, items, &mut report).await?;
    report.into_inner()?;

    let review = summary.needing_review();
    if review > 0 {
        warn!("{} record(s) need manual review, see the report", review);
    }
    Ok(summary)
}

pub async fn run_set_fund(config_path: Option<&Path>, io: IoArgs, filter: FilterArgs) -> Result<()> {
    let settings = load_settings(config_path)?;
    let table = read_mapping(&io)?;
    let client = OkapiClient::connect(&settings).await?;

    let job = SetFund::new(job_options(&io, &filter));
    run_and_report(&client, &job, table.entries(), &io).await?;
    Ok(())
}

pub async fn run_move_fund(
    config_path: Option<&Path>,
    io: IoArgs,
    filter: FilterArgs,
    fiscal_year: Option<String>,
) -> Result<()> {
    let settings = load_settings(config_path)?;
    let table = read_mapping(&io)?;
    let client = OkapiClient::connect(&settings).await?;

    let funds = FundIndex::load(&client).await?;
    let fiscal_year =
        find_fiscal_year(&client, fiscal_year.as_deref(), Local::now().date_naive()).await?;

    let job = MoveFund::new(funds, fiscal_year, job_options(&io, &filter));
    run_and_report(&client, &job, table.entries(), &io).await?;
    Ok(())
}

pub async fn run_remap_fund(config_path: Option<&Path>, io: IoArgs, filter: FilterArgs) -> Result<()> {
    let settings = load_settings(config_path)?;
    let table = read_mapping(&io)?;
    let client = OkapiClient::connect(&settings).await?;

    let funds = FundIndex::load(&client).await?;
    let job = RemapFund::new(table, funds, job_options(&io, &filter))?;
    let selected = job.select(&client).await?;
    run_and_report(&client, &job, &selected, &io).await?;
    Ok(())
}

pub async fn run_expense_class(
    config_path: Option<&Path>,
    io: IoArgs,
    filter: FilterArgs,
) -> Result<()> {
    let settings = load_settings(config_path)?;
    let table = read_mapping(&io)?;
    let client = OkapiClient::connect(&settings).await?;

    let classes = ExpenseClassIndex::load(&client).await?;
    let job = ResetExpenseClass::new(classes, job_options(&io, &filter));
    run_and_report(&client, &job, table.entries(), &io).await?;
    Ok(())
}

pub async fn run_clear_location(
    config_path: Option<&Path>,
    io: IoArgs,
    barcode_field: FieldSelector,
) -> Result<()> {
    let settings = load_settings(config_path)?;
    let input = open_input(io.infile.as_deref()).map_err(PolBatchError::from)?;
    let barcodes = read_key_list(input, io.in_dialect, &barcode_field, io.header)
        .map_err(PolBatchError::from)?;
    info!("Read {} barcodes", barcodes.len());
    let client = OkapiClient::connect(&settings).await?;

    let job = ClearLocation::new(job_options(&io, &FilterArgs::default()));
    run_and_report(&client, &job, &barcodes, &io).await?;
    Ok(())
}
