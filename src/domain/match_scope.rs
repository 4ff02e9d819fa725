//! Match identity tracking.
//!
//! [`MatchScope`] watches the match id of every inbound snapshot and reports
//! when match-scoped state must be discarded. It holds nothing but the
//! current id and an epoch counter that advances on every flush, which lets
//! callers recognise results computed for a superseded match.

use serde::Serialize;

use super::MatchId;

/// Why match-scoped state was flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushReason {
    /// A snapshot arrived for a different match.
    MatchChanged,
    /// A snapshot arrived with no match id.
    MatchEnded,
    /// The transport reported the match as abandoned.
    Abandoned,
    /// The transport asked for the match state to be cleared.
    Cleared,
}

/// Outcome of observing one match id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeTransition {
    /// Same match as before (or still no match).
    Unchanged,
    /// First match observed since the last flush.
    Started(MatchId),
    /// State was flushed.
    Flushed {
        /// Match whose state was discarded, if one was active.
        previous: Option<MatchId>,
        /// Match that is now current, if any.
        current: Option<MatchId>,
        /// Trigger of the flush.
        reason: FlushReason,
    },
}

impl ScopeTransition {
    /// Returns `true` if match-scoped state must be discarded.
    #[must_use]
    pub const fn flushes(&self) -> bool {
        matches!(self, Self::Flushed { .. })
    }
}

/// Tracks the identity of the active match.
#[derive(Debug, Default)]
pub struct MatchScope {
    current: Option<MatchId>,
    epoch: u64,
}

impl MatchScope {
    /// Creates a tracker with no active match.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active match.
    #[must_use]
    pub fn current(&self) -> Option<&MatchId> {
        self.current.as_ref()
    }

    /// Number of flushes so far.
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Records the match id of an inbound snapshot.
    ///
    /// The flush is reported before the stored id is replaced, so callers
    /// clear state belonging to `previous` before touching the new match.
    pub fn observe(&mut self, incoming: Option<&MatchId>) -> ScopeTransition {
        match (self.current.as_ref(), incoming) {
            (None, None) => ScopeTransition::Unchanged,
            (Some(current), Some(next)) if current == next => ScopeTransition::Unchanged,
            (None, Some(next)) => {
                self.current = Some(next.clone());
                ScopeTransition::Started(next.clone())
            }
            (Some(_), next) => {
                let reason = if next.is_some() {
                    FlushReason::MatchChanged
                } else {
                    FlushReason::MatchEnded
                };
                self.flush_to(next.cloned(), reason)
            }
        }
    }

    /// Flushes unconditionally, leaving no active match.
    ///
    /// Used for explicit abandon/clear signals, which apply even when no
    /// snapshot has confirmed a new match yet.
    pub fn reset(&mut self, reason: FlushReason) -> ScopeTransition {
        self.flush_to(None, reason)
    }

    fn flush_to(&mut self, next: Option<MatchId>, reason: FlushReason) -> ScopeTransition {
        self.epoch = self.epoch.wrapping_add(1);
        let previous = std::mem::replace(&mut self.current, next);
        ScopeTransition::Flushed {
            previous,
            current: self.current.clone(),
            reason,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn id(s: &str) -> MatchId {
        MatchId::from(s)
    }

    #[test]
    fn first_snapshot_starts_without_flush() {
        let mut scope = MatchScope::new();
        let t = scope.observe(Some(&id("a")));
        assert_eq!(t, ScopeTransition::Started(id("a")));
        assert!(!t.flushes());
        assert_eq!(scope.epoch(), 0);
        assert_eq!(scope.current(), Some(&id("a")));
    }

    #[test]
    fn same_match_is_noop() {
        let mut scope = MatchScope::new();
        scope.observe(Some(&id("a")));
        assert_eq!(scope.observe(Some(&id("a"))), ScopeTransition::Unchanged);
        assert_eq!(scope.epoch(), 0);
    }

    #[test]
    fn new_match_flushes_then_switches() {
        let mut scope = MatchScope::new();
        scope.observe(Some(&id("a")));
        let t = scope.observe(Some(&id("b")));
        assert_eq!(
            t,
            ScopeTransition::Flushed {
                previous: Some(id("a")),
                current: Some(id("b")),
                reason: FlushReason::MatchChanged,
            }
        );
        assert_eq!(scope.epoch(), 1);
        assert_eq!(scope.current(), Some(&id("b")));
    }

    #[test]
    fn absent_id_ends_active_match() {
        let mut scope = MatchScope::new();
        scope.observe(Some(&id("a")));
        let t = scope.observe(None);
        assert!(t.flushes());
        assert!(scope.current().is_none());
        assert_eq!(scope.observe(None), ScopeTransition::Unchanged);
    }

    #[test]
    fn absent_id_without_match_is_noop() {
        let mut scope = MatchScope::new();
        assert_eq!(scope.observe(None), ScopeTransition::Unchanged);
        assert_eq!(scope.epoch(), 0);
    }

    #[test]
    fn reset_flushes_even_without_active_match() {
        let mut scope = MatchScope::new();
        let t = scope.reset(FlushReason::Abandoned);
        assert!(t.flushes());
        assert_eq!(scope.epoch(), 1);

        scope.observe(Some(&id("a")));
        let t = scope.reset(FlushReason::Cleared);
        let ScopeTransition::Flushed { previous, current, reason } = t else {
            panic!("expected flush");
        };
        assert_eq!(previous, Some(id("a")));
        assert_eq!(current, None);
        assert_eq!(reason, FlushReason::Cleared);
    }
}
