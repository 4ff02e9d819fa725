//! Companion error types with HTTP status code mapping.
//!
//! [`CompanionError`] is the central error type of the service. Each variant
//! maps to a specific HTTP status code and structured JSON error response.
//! The domain layer only produces errors at its boundaries (reference data
//! loading, rank validation); malformed match data is tolerated instead.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{AccountId, RankOutOfRange};

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "no active match",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server/Upstream | 500 / 502                    |
#[derive(Debug, thiserror::Error)]
pub enum CompanionError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A unit rank outside 1 to 3 was supplied.
    #[error(transparent)]
    InvalidRank(#[from] RankOutOfRange),

    /// The operation needs an active match.
    #[error("no active match")]
    NoActiveMatch,

    /// Unit not known to the reference table.
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// Player not on any board of the latest snapshot.
    #[error("unknown player: {0}")]
    UnknownPlayer(AccountId),

    /// Message refers to a match that is no longer current.
    #[error("stale match: {0}")]
    StaleMatch(String),

    /// Reference data could not be read or parsed.
    #[error("reference data error: {0}")]
    ReferenceData(String),

    /// The pull source failed at the transport level.
    #[error("history fetch failed: {0}")]
    HistoryFetch(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CompanionError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidRank(_) => 1002,
            Self::NoActiveMatch => 2001,
            Self::UnknownUnit(_) => 2002,
            Self::StaleMatch(_) => 2003,
            Self::UnknownPlayer(_) => 2004,
            Self::Internal(_) => 3000,
            Self::ReferenceData(_) => 3001,
            Self::HistoryFetch(_) => 3002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::InvalidRank(_) => StatusCode::BAD_REQUEST,
            Self::NoActiveMatch | Self::UnknownUnit(_) | Self::UnknownPlayer(_) => {
                StatusCode::NOT_FOUND
            }
            Self::StaleMatch(_) => StatusCode::CONFLICT,
            Self::ReferenceData(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::HistoryFetch(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for CompanionError {
    fn from(err: reqwest::Error) -> Self {
        Self::HistoryFetch(err.to_string())
    }
}

impl IntoResponse for CompanionError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}
