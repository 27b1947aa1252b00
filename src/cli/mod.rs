//! CLI command handlers
//!
//! - Argument parsing structures
//! - Command routing
//! - One handler per subcommand

pub mod args;
pub mod commands;
pub mod router;

pub use args::{Cli, Commands};
pub use router::execute_command;
