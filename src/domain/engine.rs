//! Match engine: the single owner of all match-scoped state.
//!
//! [`MatchEngine`] ties the scope tracker, change log and pool derivations
//! together. Every operation is synchronous, bounded and free of I/O; the
//! caller serialises access and performs the pull fetch itself, handing the
//! result back through [`MatchEngine::complete_catch_up`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::engine_event::DiscardReason;
use super::{
    AbandonSignal, AccountId, ChangeBatch, ChangeEvent, ChangeLog, ChangeQuery, FlushReason,
    HeroOdds, HistoryResponse, LevelOdds, MatchId, MatchScope, MatchSnapshot, PoolCounts,
    Reconciled, ReferenceTable, ScopeTransition, SynergyPoolStat, UnitId,
    calculate_pool_counts, calculate_synergy_pool_stats, odds_by_level, shop_odds,
    shop_probability,
};

/// Proof that a catch-up fetch was issued for a particular match and epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatchUpTicket {
    /// Match the fetch is for.
    pub match_id: MatchId,
    /// Scope epoch at issue time.
    pub epoch: u64,
}

/// Result of handing a catch-up response to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchUpOutcome {
    /// History was folded in.
    Applied(Reconciled),
    /// Response was dropped without touching state.
    Stale(DiscardReason),
}

/// Result of handing a pushed batch to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Batch was merged into the current match's history.
    Merged {
        /// Match the history belongs to.
        match_id: MatchId,
        /// Events not known before this batch that survived the capacity
        /// bound, in chronological order.
        fresh: Vec<ChangeEvent>,
        /// Reconciliation counters.
        summary: Reconciled,
    },
    /// Batch belongs to no active match or to another match.
    Stale,
}

/// Point-in-time overview of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchStatus {
    /// Active match.
    pub match_id: Option<MatchId>,
    /// Scope epoch.
    pub epoch: u64,
    /// Players in the latest snapshot.
    pub player_count: usize,
    /// Retained history length.
    pub change_count: usize,
    /// History bound.
    pub change_capacity: usize,
    /// Last history mutation.
    pub last_change_update: Option<DateTime<Utc>>,
    /// Heroes in the reference table.
    pub reference_heroes: usize,
}

/// Reconciliation and analytics engine for one match at a time.
#[derive(Debug)]
pub struct MatchEngine {
    reference: Arc<ReferenceTable>,
    scope: MatchScope,
    changes: ChangeLog,
    snapshot: Option<MatchSnapshot>,
    pool: PoolCounts,
    synergies: Vec<SynergyPoolStat>,
}

impl MatchEngine {
    /// Creates an engine with no active match.
    #[must_use]
    pub fn new(reference: Arc<ReferenceTable>, history_capacity: usize) -> Self {
        let mut engine = Self {
            reference,
            scope: MatchScope::new(),
            changes: ChangeLog::new(history_capacity),
            snapshot: None,
            pool: PoolCounts::default(),
            synergies: Vec::new(),
        };
        engine.recompute();
        engine
    }

    /// Applies a full snapshot.
    ///
    /// A match transition flushes the history before the snapshot's boards
    /// are used; pool counts and synergy stats are then recomputed from
    /// this snapshot alone.
    pub fn apply_snapshot(&mut self, snapshot: MatchSnapshot) -> ScopeTransition {
        let transition = self.scope.observe(snapshot.match_id.as_ref());
        if transition.flushes() {
            self.changes.flush();
        }
        self.snapshot = Some(snapshot);
        self.recompute();
        transition
    }

    /// Merges a batch pushed by the live channel.
    ///
    /// Batches for a match other than the current one are stale and
    /// ignored; a batch without a match id is taken as the current match's.
    pub fn apply_change_batch(&mut self, batch: ChangeBatch) -> BatchOutcome {
        let Some(current) = self.scope.current().cloned() else {
            return BatchOutcome::Stale;
        };
        if batch.match_id.as_ref().is_some_and(|id| *id != current) {
            return BatchOutcome::Stale;
        }

        let known: std::collections::HashSet<_> =
            self.changes.entries().iter().map(ChangeEvent::key).collect();
        let summary = self.changes.merge(batch.changes);
        let fresh: Vec<ChangeEvent> = self
            .changes
            .entries()
            .iter()
            .filter(|e| !known.contains(&e.key()))
            .cloned()
            .collect();
        BatchOutcome::Merged {
            match_id: current,
            fresh,
            summary,
        }
    }

    /// Handles an abandon signal: flushes unconditionally.
    pub fn abandon(&mut self, _signal: &AbandonSignal) -> ScopeTransition {
        self.reset(FlushReason::Abandoned)
    }

    /// Handles an explicit clear request: flushes unconditionally.
    pub fn clear(&mut self) -> ScopeTransition {
        self.reset(FlushReason::Cleared)
    }

    fn reset(&mut self, reason: FlushReason) -> ScopeTransition {
        let transition = self.scope.reset(reason);
        self.changes.flush();
        self.snapshot = None;
        self.recompute();
        transition
    }

    /// Installs new reference data and recomputes the derivations.
    pub fn set_reference(&mut self, reference: Arc<ReferenceTable>) {
        self.reference = reference;
        self.recompute();
    }

    fn recompute(&mut self) {
        let players = match &self.snapshot {
            Some(snapshot) => snapshot.players.as_slice(),
            None => &[],
        };
        self.pool = calculate_pool_counts(players, &self.reference);
        self.synergies = calculate_synergy_pool_stats(&self.pool, &self.reference);
    }

    /// Issues a ticket for a catch-up fetch of the active match.
    #[must_use]
    pub fn begin_catch_up(&self) -> Option<CatchUpTicket> {
        self.scope.current().map(|match_id| CatchUpTicket {
            match_id: match_id.clone(),
            epoch: self.scope.epoch(),
        })
    }

    /// Applies a catch-up response unless it has gone stale.
    ///
    /// The response is dropped when a flush happened after the ticket was
    /// issued or when it names a different match. Otherwise it is folded
    /// into the history together with everything merged in the meantime.
    pub fn complete_catch_up(
        &mut self,
        ticket: &CatchUpTicket,
        response: HistoryResponse,
    ) -> CatchUpOutcome {
        if ticket.epoch != self.scope.epoch() || self.scope.current() != Some(&ticket.match_id) {
            return CatchUpOutcome::Stale(DiscardReason::Superseded);
        }
        if response
            .match_id
            .as_ref()
            .is_some_and(|id| *id != ticket.match_id)
        {
            return CatchUpOutcome::Stale(DiscardReason::MatchMismatch);
        }
        CatchUpOutcome::Applied(self.changes.replace(response.changes))
    }

    /// Active match.
    #[must_use]
    pub fn current_match(&self) -> Option<&MatchId> {
        self.scope.current()
    }

    /// Deduplicated history of the active match.
    #[must_use]
    pub const fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    /// History newest first, filtered.
    #[must_use]
    pub fn query_changes(&self, query: &ChangeQuery) -> Vec<ChangeEvent> {
        self.changes.query(query)
    }

    /// Latest snapshot of the active match.
    #[must_use]
    pub const fn snapshot(&self) -> Option<&MatchSnapshot> {
        self.snapshot.as_ref()
    }

    /// Pool counts derived from the latest snapshot.
    #[must_use]
    pub const fn pool(&self) -> &PoolCounts {
        &self.pool
    }

    /// Synergy stats derived from the latest snapshot.
    #[must_use]
    pub fn synergies(&self) -> &[SynergyPoolStat] {
        &self.synergies
    }

    /// Reference data in use.
    #[must_use]
    pub const fn reference(&self) -> &Arc<ReferenceTable> {
        &self.reference
    }

    /// Shop appearance probability of one unit at one level.
    #[must_use]
    pub fn probability(&self, unit_id: UnitId, level: u32) -> f64 {
        shop_probability(unit_id, level, &self.pool, &self.reference)
    }

    /// Shop appearance probability of one unit at every level.
    #[must_use]
    pub fn odds_by_level(&self, unit_id: UnitId) -> Vec<LevelOdds> {
        odds_by_level(unit_id, &self.pool, &self.reference)
    }

    /// Next-reroll odds for the heroes a player owns, or `None` when the
    /// player is not part of the latest snapshot.
    #[must_use]
    pub fn shop_odds(&self, account_id: AccountId, shop_units: &[UnitId], level: u32) -> Option<Vec<HeroOdds>> {
        let board = self.snapshot.as_ref()?.board(account_id)?;
        Some(shop_odds(&board.units, shop_units, level, &self.pool, &self.reference))
    }

    /// Point-in-time overview.
    #[must_use]
    pub fn status(&self) -> MatchStatus {
        MatchStatus {
            match_id: self.scope.current().cloned(),
            epoch: self.scope.epoch(),
            player_count: self.snapshot.as_ref().map_or(0, |s| s.players.len()),
            change_count: self.changes.len(),
            change_capacity: self.changes.capacity(),
            last_change_update: self.changes.last_update(),
            reference_heroes: self.reference.len(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{
        ChangeKind, EventTime, HeroDefinition, KeywordId, PlayerBoard, Rank, SynergyCatalog, Unit,
    };

    fn reference() -> Arc<ReferenceTable> {
        let heroes = vec![
            HeroDefinition {
                id: UnitId(1),
                display_name: "Axe".to_string(),
                draft_tier: 1,
                keywords: vec![KeywordId(1)],
            },
            HeroDefinition {
                id: UnitId(2),
                display_name: "Luna".to_string(),
                draft_tier: 1,
                keywords: vec![KeywordId(1)],
            },
        ];
        let catalog = SynergyCatalog::new([(KeywordId(1), "Brawny".to_string())]);
        Arc::new(ReferenceTable::new(heroes, catalog))
    }

    fn engine() -> MatchEngine {
        MatchEngine::new(reference(), 500)
    }

    fn snapshot(match_id: Option<&str>, units: &[(i32, Rank)]) -> MatchSnapshot {
        MatchSnapshot {
            match_id: match_id.map(MatchId::from),
            players: vec![PlayerBoard {
                account_id: AccountId(7),
                units: units.iter().map(|(id, r)| Unit::new(UnitId(*id), *r)).collect(),
            }],
            timestamp: EventTime::Missing,
        }
    }

    fn bought(ts: i64, unit: i32) -> ChangeEvent {
        ChangeEvent::new(ChangeKind::Bought, AccountId(7), EventTime::millis(ts)).with_unit(UnitId(unit))
    }

    fn batch(match_id: Option<&str>, changes: Vec<ChangeEvent>) -> ChangeBatch {
        ChangeBatch {
            match_id: match_id.map(MatchId::from),
            changes,
            ..ChangeBatch::default()
        }
    }

    fn response(match_id: &str, changes: Vec<ChangeEvent>) -> HistoryResponse {
        HistoryResponse {
            status: "success".to_string(),
            match_id: Some(MatchId::from(match_id)),
            count: changes.len(),
            changes,
        }
    }

    #[test]
    fn new_engine_reports_full_pool() {
        let engine = engine();
        assert_eq!(engine.pool().remaining(UnitId(1)), 30);
        assert_eq!(engine.synergies().first().map(|s| s.remaining_pool), Some(60));
        assert!(engine.current_match().is_none());
    }

    #[test]
    fn snapshot_recomputes_pool_and_synergies() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[(1, Rank::Two), (1, Rank::One)]));
        assert_eq!(engine.pool().remaining(UnitId(1)), 26);
        assert_eq!(engine.synergies().first().map(|s| s.remaining_pool), Some(56));
    }

    #[test]
    fn batch_before_any_match_is_stale() {
        let mut engine = engine();
        assert_eq!(engine.apply_change_batch(batch(Some("m"), vec![bought(1, 1)])), BatchOutcome::Stale);
        assert!(engine.changes().is_empty());
    }

    #[test]
    fn batch_for_other_match_is_stale() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        let outcome = engine.apply_change_batch(batch(Some("other"), vec![bought(1, 1)]));
        assert_eq!(outcome, BatchOutcome::Stale);
    }

    #[test]
    fn batch_reports_only_fresh_events() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        engine.apply_change_batch(batch(Some("m"), vec![bought(1, 1)]));
        let outcome = engine.apply_change_batch(batch(None, vec![bought(1, 1), bought(2, 2), bought(2, 2)]));
        let BatchOutcome::Merged { fresh, summary, .. } = outcome else {
            panic!("expected merge");
        };
        assert_eq!(fresh, vec![bought(2, 2)]);
        assert_eq!(summary.accepted, 1);
        assert_eq!(engine.changes().len(), 2);
    }

    #[test]
    fn evicted_event_pushed_again_is_not_fresh() {
        let mut engine = MatchEngine::new(reference(), 2);
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        engine.apply_change_batch(batch(None, vec![bought(1, 1), bought(2, 2), bought(3, 1)]));

        let outcome = engine.apply_change_batch(batch(None, vec![bought(1, 1)]));
        let BatchOutcome::Merged { fresh, summary, .. } = outcome else {
            panic!("expected merge");
        };
        assert!(fresh.is_empty());
        assert_eq!(summary.accepted, 0);
        assert_eq!(engine.changes().entries(), &[bought(2, 2), bought(3, 1)]);
    }

    #[test]
    fn match_change_flushes_history_before_new_snapshot() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("a"), &[(1, Rank::Three)]));
        engine.apply_change_batch(batch(Some("a"), vec![bought(1, 1)]));

        let transition = engine.apply_snapshot(snapshot(Some("b"), &[(2, Rank::One)]));
        assert!(transition.flushes());
        assert!(engine.changes().is_empty());
        assert_eq!(engine.pool().remaining(UnitId(1)), 30);
        assert_eq!(engine.pool().remaining(UnitId(2)), 29);
    }

    #[test]
    fn abandon_flushes_without_snapshot() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("a"), &[(1, Rank::Two)]));
        engine.apply_change_batch(batch(Some("a"), vec![bought(1, 1)]));

        let transition = engine.abandon(&AbandonSignal::default());
        assert!(transition.flushes());
        assert!(engine.changes().is_empty());
        assert!(engine.current_match().is_none());
        assert!(engine.snapshot().is_none());
        assert_eq!(engine.pool().remaining(UnitId(1)), 30);
    }

    #[test]
    fn catch_up_folds_in_live_events() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        let Some(ticket) = engine.begin_catch_up() else {
            panic!("expected ticket");
        };
        engine.apply_change_batch(batch(Some("m"), vec![bought(30, 3)]));

        let outcome = engine.complete_catch_up(&ticket, response("m", vec![bought(10, 1), bought(20, 2)]));
        assert!(matches!(outcome, CatchUpOutcome::Applied(r) if r.retained == 3));
        assert_eq!(engine.changes().len(), 3);
    }

    #[test]
    fn catch_up_after_flush_is_discarded() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        let Some(ticket) = engine.begin_catch_up() else {
            panic!("expected ticket");
        };
        engine.clear();
        engine.apply_snapshot(snapshot(Some("m"), &[]));

        let outcome = engine.complete_catch_up(&ticket, response("m", vec![bought(10, 1)]));
        assert_eq!(outcome, CatchUpOutcome::Stale(DiscardReason::Superseded));
        assert!(engine.changes().is_empty());
    }

    #[test]
    fn catch_up_for_other_match_is_discarded() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        let Some(ticket) = engine.begin_catch_up() else {
            panic!("expected ticket");
        };
        let outcome = engine.complete_catch_up(&ticket, response("x", vec![bought(10, 1)]));
        assert_eq!(outcome, CatchUpOutcome::Stale(DiscardReason::MatchMismatch));
    }

    #[test]
    fn no_ticket_without_match() {
        assert!(engine().begin_catch_up().is_none());
    }

    #[test]
    fn reference_arriving_late_recomputes() {
        let mut engine = MatchEngine::new(Arc::new(ReferenceTable::default()), 500);
        engine.apply_snapshot(snapshot(Some("m"), &[(1, Rank::One)]));
        assert!(engine.pool().is_empty());
        assert_eq!(engine.probability(UnitId(1), 1), 0.0);

        engine.set_reference(reference());
        assert_eq!(engine.pool().remaining(UnitId(1)), 29);
        assert!(engine.probability(UnitId(1), 1) > 0.0);
    }

    #[test]
    fn shop_odds_needs_a_known_player() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[(1, Rank::One)]));
        assert!(engine.shop_odds(AccountId(99), &[], 1).is_none());
        let Some(odds) = engine.shop_odds(AccountId(7), &[UnitId(1)], 1) else {
            panic!("player 7 is on the board");
        };
        assert_eq!(odds.len(), 1);
        assert!(odds.iter().all(|o| o.in_shop && o.probability == 0.0));
    }

    #[test]
    fn status_summarises_state() {
        let mut engine = engine();
        engine.apply_snapshot(snapshot(Some("m"), &[]));
        engine.apply_change_batch(batch(Some("m"), vec![bought(1, 1)]));
        let status = engine.status();
        assert_eq!(status.match_id, Some(MatchId::from("m")));
        assert_eq!(status.player_count, 1);
        assert_eq!(status.change_count, 1);
        assert_eq!(status.change_capacity, 500);
        assert_eq!(status.reference_heroes, 2);
    }
}
