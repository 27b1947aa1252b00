//! `expense-classes`: list the tenant's expense classes

use crate::error::common;
use crate::finance::{format_expense_classes, ExpenseClassIndex};
use crate::folio::OkapiClient;
use super::jobs::load_settings;
use anyhow::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

pub async fn run_expense_classes(config_path: Option<&Path>, outfile: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config_path)?;
    let client = OkapiClient::connect(&settings).await?;
    let classes = ExpenseClassIndex::load(&client).await?;

    let mut output = crate::batch::open_output(outfile.as_deref()).map_err(common::unwritable_report)?;
    output
        .write_all(format_expense_classes(classes.all()).as_bytes())
        .map_err(common::unwritable_report)?;
    output.flush().map_err(common::unwritable_report)?;
    Ok(())
}
