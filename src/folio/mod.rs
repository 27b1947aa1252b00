//! Access to the platform's REST API through the Okapi gateway
//!
//! `FolioApi` is the seam every batch job talks through. `OkapiClient` is the
//! reqwest implementation; `MockFolioClient` keeps records in memory for tests.

pub mod client;
pub mod mock;
pub mod query;

pub use client::OkapiClient;
pub use mock::MockFolioClient;

use crate::error::{ErrorCode, PolBatchError};
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub const PO_LINES_PATH: &str = "/orders/order-lines";
pub const FUNDS_PATH: &str = "/finance/funds";
pub const FISCAL_YEARS_PATH: &str = "/finance/fiscal-years";
pub const EXPENSE_CLASSES_PATH: &str = "/finance/expense-classes";
pub const TRANSACTIONS_PATH: &str = "/finance-storage/transactions";
pub const ITEMS_PATH: &str = "/inventory/items";

pub fn po_line_path(id: &str) -> String {
    format!("{}/{}", PO_LINES_PATH, id)
}

pub fn item_path(id: &str) -> String {
    format!("{}/{}", ITEMS_PATH, id)
}

pub fn release_encumbrance_path(transaction_id: &str) -> String {
    format!("/finance/release-encumbrance/{}", transaction_id)
}

/// Status and body of a write call, whatever the status was
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The host could not be reached or the request timed out
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The token was refused; the session is unusable
    #[error("unauthorized ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// Any other non-success status on a read
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether the error ends the whole run rather than a single record
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Unauthorized { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::Status { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<ApiError> for PolBatchError {
    fn from(err: ApiError) -> Self {
        match &err {
            ApiError::Transport { url, message } => PolBatchError::connection_with_code(
                ErrorCode::CONNECTION_UNREACHABLE,
                message.clone(),
                Some(url.clone()),
            ),
            ApiError::Unauthorized { .. } => PolBatchError::auth_with_code(
                ErrorCode::AUTH_EXPIRED,
                "token rejected by Okapi",
            )
            .with_source(err),
            ApiError::Status { .. } | ApiError::Decode(_) => {
                PolBatchError::reference_with_code(ErrorCode::REFERENCE_UNREADABLE, "API call failed")
                    .with_source(err)
            }
        }
    }
}

/// Operations the batch jobs need from the platform.
///
/// Reads return decoded JSON or an `ApiError`. Writes return the raw
/// `ApiResponse` for any HTTP status, so callers can report rejections per
/// record; only transport and authorization problems are errors.
#[async_trait]
pub trait FolioApi: Send + Sync {
    /// GET a single resource or one page of a collection
    async fn get_json(&self, path: &str, query: Option<&str>) -> Result<Value, ApiError>;

    /// GET every record of a collection, following `limit`/`offset` paging
    async fn get_all(
        &self,
        path: &str,
        key: &str,
        query: Option<&str>,
    ) -> Result<Vec<Value>, ApiError>;

    async fn put_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError>;

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        let transport = ApiError::Transport {
            url: "https://okapi".into(),
            message: "connection refused".into(),
        };
        assert!(transport.is_fatal());
        assert!(ApiError::Unauthorized { status: 401, body: String::new() }.is_fatal());
        assert!(!ApiError::Status { status: 422, body: String::new() }.is_fatal());
        assert!(!ApiError::Decode("eof".into()).is_fatal());
    }

    #[test]
    fn test_conversion_exit_codes() {
        let err: PolBatchError = ApiError::Transport {
            url: "https://okapi".into(),
            message: "timed out".into(),
        }
        .into();
        assert_eq!(err.exit_code(), 4);

        let err: PolBatchError = ApiError::Unauthorized { status: 401, body: "expired".into() }.into();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_paths() {
        assert_eq!(po_line_path("abc"), "/orders/order-lines/abc");
        assert_eq!(release_encumbrance_path("t1"), "/finance/release-encumbrance/t1");
        assert!(ApiResponse::new(204, "").is_success());
        assert!(!ApiResponse::new(422, "bad").is_success());
    }
}
