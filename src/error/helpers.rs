use super::{ErrorCode, PolBatchError};

/// Extension trait for convenient error conversion
pub trait ErrorExt<T> {
    fn to_config_error(self, message: impl Into<String>) -> Result<T, PolBatchError>;
    fn to_reference_error(self, message: impl Into<String>) -> Result<T, PolBatchError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_config_error(self, message: impl Into<String>) -> Result<T, PolBatchError> {
        self.map_err(|e| PolBatchError::config(message).with_source(e))
    }

    fn to_reference_error(self, message: impl Into<String>) -> Result<T, PolBatchError> {
        self.map_err(|e| {
            PolBatchError::reference_with_code(ErrorCode::REFERENCE_UNREADABLE, message)
                .with_source(e)
        })
    }
}

/// Helper functions for common error scenarios
pub mod common {
    use super::*;

    /// Create a not found error for configuration
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> PolBatchError {
        PolBatchError::config_with_code(
            ErrorCode::CONFIG_NOT_FOUND,
            format!("Configuration file not found: {}", path.as_ref().display()),
            Some(path.as_ref().to_path_buf()),
        )
    }

    /// Create a missing setting error naming both the file key and the env var
    pub fn missing_setting(key: &str, env_var: &str) -> PolBatchError {
        PolBatchError::config_with_code(
            ErrorCode::CONFIG_MISSING_REQUIRED,
            format!("'{}' is not set (config file or {})", key, env_var),
            None,
        )
    }

    pub fn unknown_fund(code: &str) -> PolBatchError {
        PolBatchError::reference_with_code(
            ErrorCode::REFERENCE_UNKNOWN_FUND,
            format!("fund code '{}' does not exist", code),
        )
    }

    pub fn no_fiscal_year(which: &str) -> PolBatchError {
        PolBatchError::reference_with_code(
            ErrorCode::REFERENCE_NO_FISCAL_YEAR,
            format!("no fiscal year found for {}", which),
        )
    }

    pub fn unwritable_report(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> PolBatchError {
        PolBatchError::input_with_code(ErrorCode::OUTPUT_UNWRITABLE, "cannot write report", None)
            .with_source(source)
    }
}
