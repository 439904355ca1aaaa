//! Error responses.
//!
//! Every failure leaves the API as `{"error": CODE, "message": ..., "details": ...}`
//! with the status the error maps to. Database and internal errors are
//! logged and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tally_core::{LedgerError, ValidationError};
use tally_shared::AppError;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A ledger operation failed.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A request-level failure outside the ledger (tenant, role, ...).
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Ledger(err.into())
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code, e.g. `PERIOD_CLOSED`.
    pub error: &'static str,
    /// Human-readable description.
    pub message: String,
    /// Data needed to resolve the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// HTTP status of the response.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        let code = match self {
            Self::Ledger(err) => err.http_status_code(),
            Self::App(err) => err.status_code(),
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Error code of the response.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ledger(err) => err.error_code(),
            Self::App(err) => err.error_code(),
        }
    }

    fn body(self) -> ErrorBody {
        let error = self.code();
        match self {
            Self::Ledger(err @ (LedgerError::Database(_) | LedgerError::Internal(_))) => {
                error!(error = %err, "Ledger operation failed");
                ErrorBody {
                    error,
                    message: "An internal error occurred".to_string(),
                    details: None,
                }
            }
            Self::Ledger(err) => ErrorBody {
                error,
                message: err.to_string(),
                details: err.details(),
            },
            Self::App(err @ (AppError::Config(_) | AppError::Database(_) | AppError::Internal(_))) => {
                error!(error = %err, "Request failed");
                ErrorBody {
                    error,
                    message: "An internal error occurred".to_string(),
                    details: None,
                }
            }
            Self::App(err) => ErrorBody {
                error,
                message: err.to_string(),
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}
