use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

pub mod codes;
pub mod helpers;

pub use codes::ErrorCode;
pub use helpers::{common, ErrorExt};

/// Fatal errors that abort a batch run.
///
/// Per-record problems never surface as a `PolBatchError`; they are turned
/// into report rows by the batch runner. Anything that reaches this type
/// stops the run before (or instead of) touching further records.
#[derive(Error, Debug)]
pub enum PolBatchError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Authentication error: {message}")]
    Auth {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Connection error: {message}")]
    Connection {
        code: u16,
        message: String,
        url: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Input error: {message}")]
    Input {
        code: u16,
        message: String,
        line: Option<u64>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Reference data error: {message}")]
    Reference {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PolBatchError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::CONFIG_GENERIC,
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a configuration error with specific code and file path
    pub fn config_with_code(code: u16, message: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            path,
            source: None,
        }
    }

    pub fn auth_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_with_code(code: u16, message: impl Into<String>, url: Option<String>) -> Self {
        Self::Connection {
            code,
            message: message.into(),
            url,
            source: None,
        }
    }

    pub fn input_with_code(code: u16, message: impl Into<String>, line: Option<u64>) -> Self {
        Self::Input {
            code,
            message: message.into(),
            line,
            source: None,
        }
    }

    pub fn reference_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Reference {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Auth { source: src, .. }
            | Self::Connection { source: src, .. }
            | Self::Input { source: src, .. }
            | Self::Reference { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Auth { message, .. }
            | Self::Connection { message, .. }
            | Self::Input { message, .. }
            | Self::Reference { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => 2,
            Self::Auth { .. } => 3,
            Self::Connection { .. } => 4,
            Self::Input { .. } => 5,
            Self::Reference { .. } => 6,
        }
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Auth { code, .. }
            | Self::Connection { code, .. }
            | Self::Input { code, .. }
            | Self::Reference { code, .. } => *code,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { message, path, .. } => {
                if let Some(p) = path {
                    format!("Configuration problem in {}: {}", p.display(), message)
                } else {
                    format!("Configuration problem: {}", message)
                }
            }
            Self::Auth { message, .. } => format!("Login to Okapi failed: {}", message),
            Self::Connection { message, url, .. } => {
                if let Some(u) = url {
                    format!("Cannot reach {}: {}", u, message)
                } else {
                    format!("Connection problem: {}", message)
                }
            }
            Self::Input { message, line, .. } => {
                if let Some(l) = line {
                    format!("Input error at line {}: {}", l, message)
                } else {
                    format!("Input error: {}", message)
                }
            }
            Self::Reference { message, .. } => format!("Reference data problem: {}", message),
        }
    }

    /// Get a developer-friendly error message with full chain
    pub fn developer_message(&self) -> String {
        let mut out = format!("{}", self);
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(&format!("\n  caused by: {}", cause));
            source = cause.source();
        }
        out
    }
}

/// Type alias for Results using PolBatchError
pub type Result<T> = std::result::Result<T, PolBatchError>;
