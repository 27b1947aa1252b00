//! Subcommand handlers

pub mod expense_classes;
pub mod jobs;

pub use expense_classes::run_expense_classes;
pub use jobs::{
    run_clear_location, run_expense_class, run_move_fund, run_remap_fund, run_set_fund,
};
