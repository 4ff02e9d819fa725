//! Pull source: on-demand historical change fetches.
//!
//! [`HistorySource`] is the seam between the service and whatever serves
//! authoritative change history. [`HttpHistorySource`] talks to the backend
//! over HTTP; tests substitute their own implementation.

pub mod http;

use async_trait::async_trait;

use crate::domain::{HistoryRequest, HistoryResponse};
use crate::error::CompanionError;

pub use http::HttpHistorySource;

/// Provider of historical change events for a match.
#[async_trait]
pub trait HistorySource: Send + Sync + std::fmt::Debug {
    /// Fetches the change history described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::HistoryFetch`] when the source cannot be
    /// reached or answers with an error.
    async fn fetch(&self, request: &HistoryRequest) -> Result<HistoryResponse, CompanionError>;
}
