//! Events reflecting engine state changes.
//!
//! Every state change emits an [`EngineEvent`] through the
//! [`super::EventBus`]. Events are broadcast to WebSocket subscribers, which
//! filter them by [`EngineEvent::topic`].

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ChangeEvent, FlushReason, MatchId, PoolCounts, Reconciled, SynergyPoolStat};

/// Why a catch-up response was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The match was flushed while the fetch was in flight.
    Superseded,
    /// The response belongs to a different match.
    MatchMismatch,
    /// The fetch failed at the transport level.
    FetchFailed,
}

/// Domain event emitted after every engine mutation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// First snapshot of a match was accepted.
    MatchStarted {
        /// Match now current.
        match_id: MatchId,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Match-scoped state was discarded.
    MatchFlushed {
        /// Match whose state was discarded.
        previous: Option<MatchId>,
        /// Match now current, if any.
        current: Option<MatchId>,
        /// Trigger of the flush.
        reason: FlushReason,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A pushed batch was merged into the history.
    ChangesMerged {
        /// Match the history belongs to.
        match_id: MatchId,
        /// Events from the batch that were not already known.
        changes: Vec<ChangeEvent>,
        /// Reconciliation counters.
        summary: Reconciled,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A catch-up response was folded into the history.
    HistoryReplaced {
        /// Match the history belongs to.
        match_id: MatchId,
        /// Reconciliation counters.
        summary: Reconciled,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A catch-up response was dropped.
    CatchUpDiscarded {
        /// Match the fetch was issued for.
        match_id: MatchId,
        /// Why it was dropped.
        reason: DiscardReason,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Pool counts were recomputed.
    PoolUpdated {
        /// Match the pool belongs to, if any.
        match_id: Option<MatchId>,
        /// Fresh pool counts.
        pool: PoolCounts,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Synergy rollup was recomputed.
    SynergiesUpdated {
        /// Match the rollup belongs to, if any.
        match_id: Option<MatchId>,
        /// Fresh synergy stats, most available first.
        synergies: Vec<SynergyPoolStat>,
        /// Event timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// Subscription topic this event is delivered on.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::MatchStarted { .. } | Self::MatchFlushed { .. } | Self::CatchUpDiscarded { .. } => {
                "match"
            }
            Self::ChangesMerged { .. } | Self::HistoryReplaced { .. } => "changes",
            Self::PoolUpdated { .. } => "pool",
            Self::SynergiesUpdated { .. } => "synergies",
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::MatchStarted { .. } => "match_started",
            Self::MatchFlushed { .. } => "match_flushed",
            Self::ChangesMerged { .. } => "changes_merged",
            Self::HistoryReplaced { .. } => "history_replaced",
            Self::CatchUpDiscarded { .. } => "catch_up_discarded",
            Self::PoolUpdated { .. } => "pool_updated",
            Self::SynergiesUpdated { .. } => "synergies_updated",
        }
    }
}
