//! Inbound transport messages other than snapshots.

use serde::{Deserialize, Serialize};

use super::{AccountId, ChangeEvent, EventTime, MatchId};

/// Change events pushed by the live channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    /// Match the batch belongs to.
    #[serde(default)]
    pub match_id: Option<MatchId>,
    /// Player the batch was produced for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Events in arrival order.
    #[serde(default)]
    pub changes: Vec<ChangeEvent>,
    /// Send time.
    #[serde(default, skip_serializing_if = "EventTime::is_missing")]
    pub timestamp: EventTime,
}

/// Filters of a historical change fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRequest {
    /// Match to fetch history for.
    pub match_id: MatchId,
    /// Only this player's events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<AccountId>,
    /// Only events of this round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    /// Only events of this phase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// At most this many events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl HistoryRequest {
    /// Unfiltered request for the whole history of a match.
    #[must_use]
    pub const fn full(match_id: MatchId) -> Self {
        Self {
            match_id,
            account_id: None,
            round: None,
            phase: None,
            limit: None,
        }
    }
}

/// Response of the pull source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Backend status text (`"success"` on success).
    #[serde(default)]
    pub status: String,
    /// Match the history belongs to.
    #[serde(default)]
    pub match_id: Option<MatchId>,
    /// Events, in any order.
    #[serde(default)]
    pub changes: Vec<ChangeEvent>,
    /// Number of events the backend reports.
    #[serde(default)]
    pub count: usize,
}

/// Transport signal that a match was abandoned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AbandonSignal {
    /// Match that was abandoned.
    #[serde(default)]
    pub match_id: Option<MatchId>,
    /// Free-form reason.
    #[serde(default)]
    pub reason: String,
    /// Signal time.
    #[serde(default, skip_serializing_if = "EventTime::is_missing")]
    pub timestamp: EventTime,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn batch_parses_with_missing_fields() {
        let json = r#"{"match_id": "m", "changes": [{"type": "bought", "unit_id": 3}]}"#;
        let Ok(batch) = serde_json::from_str::<ChangeBatch>(json) else {
            panic!("batch should parse");
        };
        assert_eq!(batch.match_id, Some(MatchId::from("m")));
        assert_eq!(batch.changes.len(), 1);
        assert!(batch.account_id.is_none());
    }

    #[test]
    fn history_response_parses_backend_shape() {
        let json = r#"{"status": "success", "match_id": "m", "changes": [], "count": 0}"#;
        let Ok(response) = serde_json::from_str::<HistoryResponse>(json) else {
            panic!("response should parse");
        };
        assert_eq!(response.status, "success");
        assert_eq!(response.count, 0);
    }

    #[test]
    fn abandon_signal_reason_defaults_empty() {
        let Ok(signal) = serde_json::from_str::<AbandonSignal>(r#"{"match_id": "m"}"#) else {
            panic!("signal should parse");
        };
        assert!(signal.reason.is_empty());
    }
}
