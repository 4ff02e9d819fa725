//! Shared DTO types used across multiple endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{Reconciled, ScopeTransition};

/// Counters of one history reconciliation.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct ReconciledDto {
    /// Events in the input.
    pub received: usize,
    /// Input events not already known.
    pub accepted: usize,
    /// Oldest events dropped to respect the capacity.
    pub evicted: usize,
    /// History length afterwards.
    pub retained: usize,
}

impl From<Reconciled> for ReconciledDto {
    fn from(r: Reconciled) -> Self {
        Self {
            received: r.received,
            accepted: r.accepted,
            evicted: r.evicted,
            retained: r.retained,
        }
    }
}

/// Effect of a message on the active match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransitionResponse {
    /// `"unchanged"`, `"started"` or `"flushed"`.
    pub transition: String,
    /// Match current after the message.
    pub match_id: Option<String>,
    /// Match whose state was discarded, for flushes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_match_id: Option<String>,
    /// Flush trigger (`match_changed`, `match_ended`, `abandoned`, `cleared`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&ScopeTransition> for TransitionResponse {
    fn from(transition: &ScopeTransition) -> Self {
        match transition {
            ScopeTransition::Unchanged => Self {
                transition: "unchanged".to_string(),
                match_id: None,
                previous_match_id: None,
                reason: None,
            },
            ScopeTransition::Started(match_id) => Self {
                transition: "started".to_string(),
                match_id: Some(match_id.to_string()),
                previous_match_id: None,
                reason: None,
            },
            ScopeTransition::Flushed {
                previous,
                current,
                reason,
            } => Self {
                transition: "flushed".to_string(),
                match_id: current.as_ref().map(ToString::to_string),
                previous_match_id: previous.as_ref().map(ToString::to_string),
                reason: serde_json::to_value(reason)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string)),
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{FlushReason, MatchId};

    #[test]
    fn flush_transition_reports_reason() {
        let dto = TransitionResponse::from(&ScopeTransition::Flushed {
            previous: Some(MatchId::from("a")),
            current: Some(MatchId::from("b")),
            reason: FlushReason::MatchChanged,
        });
        assert_eq!(dto.transition, "flushed");
        assert_eq!(dto.match_id.as_deref(), Some("b"));
        assert_eq!(dto.previous_match_id.as_deref(), Some("a"));
        assert_eq!(dto.reason.as_deref(), Some("match_changed"));
    }
}
