//! HTTP implementation of the pull source.

use std::time::Duration;

use async_trait::async_trait;

use super::HistorySource;
use crate::domain::{HistoryRequest, HistoryResponse};
use crate::error::CompanionError;

/// Fetches change history from
/// `GET {base_url}/api/matches/{match_id}/changes`.
#[derive(Debug, Clone)]
pub struct HttpHistorySource {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpHistorySource {
    /// Creates a source for the backend at `base_url`.
    #[must_use]
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// URL of the history endpoint for one match.
    ///
    /// The match id is a single path segment and is percent-encoded.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::HistoryFetch`] if the base URL does not
    /// parse or cannot carry a path.
    pub fn changes_url(&self, request: &HistoryRequest) -> Result<reqwest::Url, CompanionError> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|err| {
            CompanionError::HistoryFetch(format!("invalid backend url {}: {err}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                CompanionError::HistoryFetch(format!("backend url {} has no path", self.base_url))
            })?
            .pop_if_empty()
            .extend(["api", "matches", request.match_id.as_str(), "changes"]);
        Ok(url)
    }

    fn query_params(request: &HistoryRequest) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(account_id) = request.account_id {
            params.push(("account_id", account_id.to_string()));
        }
        if let Some(round) = request.round {
            params.push(("round", round.to_string()));
        }
        if let Some(phase) = &request.phase {
            params.push(("phase", phase.clone()));
        }
        if let Some(limit) = request.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn fetch(&self, request: &HistoryRequest) -> Result<HistoryResponse, CompanionError> {
        let url = self.changes_url(request)?;
        tracing::debug!(%url, match_id = %request.match_id, "fetching change history");

        let response = self
            .client
            .get(url.clone())
            .query(&Self::query_params(request))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CompanionError::HistoryFetch(format!(
                "{url} answered {status}"
            )));
        }

        let body: HistoryResponse = response.json().await?;
        if !body.status.is_empty() && body.status != "success" {
            return Err(CompanionError::HistoryFetch(format!(
                "backend status {}",
                body.status
            )));
        }
        Ok(body)
    }
}
