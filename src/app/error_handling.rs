//! Fatal error reporting
//!
//! Per-record failures never get here; they end up in the report. Anything
//! reaching `handle_fatal_error` stopped the run.

use crate::error::PolBatchError;
use tracing::error;

/// Exit status after Ctrl-C
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Exit code for an error, looking through anyhow context for a `PolBatchError`
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<PolBatchError>()
        .map(PolBatchError::exit_code)
        .unwrap_or(1)
}

/// Handle fatal errors and exit with appropriate status code
///
/// - `verbose = 0`: user-facing message only
/// - `verbose >= 1`: adds the full source chain
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {:#}", error);

    if let Some(batch_err) = error.downcast_ref::<PolBatchError>() {
        eprintln!("{}", batch_err.user_message());
        if verbose >= 1 {
            eprintln!("\nContext Chain:\n{}", batch_err.developer_message());
        }
    } else {
        eprintln!("Error: {error}");
        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {}: {}", i, cause);
            }
        }
    }

    std::process::exit(exit_code_for(&error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use anyhow::Context;

    #[test]
    fn test_exit_code_survives_context() {
        let err: anyhow::Result<()> =
            Err(PolBatchError::auth_with_code(ErrorCode::AUTH_REJECTED, "login rejected")).context("connecting to okapi");
        assert_eq!(exit_code_for(&err.unwrap_err()), 3);
    }

    #[test]
    fn test_foreign_error_exits_one() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), 1);
    }
}
