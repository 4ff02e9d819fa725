//! Companion service: serialises engine access and emits events.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::{
    AbandonSignal, AccountId, BatchOutcome, CatchUpOutcome, ChangeBatch, ChangeEvent,
    ChangeQuery, DiscardReason, EngineEvent, EventBus, HeroOdds, HistoryRequest, LevelOdds,
    MatchEngine, MatchId, MatchSnapshot, MatchStatus, PoolCounts, Reconciled, ReferenceTable,
    ScopeTransition, SynergyPoolStat, UnitId,
};
use crate::error::CompanionError;
use crate::source::HistorySource;

/// Orchestration layer around the [`MatchEngine`].
///
/// Owns the engine behind a [`tokio::sync::RwLock`], the [`EventBus`] for
/// event emission and the pull source for catch-up fetches. Every mutation
/// follows the pattern: acquire lock → call the engine → emit events →
/// release lock, so subscribers see events in the order the state changed.
/// The lock is never held across a fetch.
#[derive(Debug, Clone)]
pub struct CompanionService {
    engine: Arc<RwLock<MatchEngine>>,
    event_bus: EventBus,
    source: Arc<dyn HistorySource>,
    catch_up_on_match_start: bool,
}

impl CompanionService {
    /// Creates a new `CompanionService`.
    #[must_use]
    pub fn new(
        engine: MatchEngine,
        event_bus: EventBus,
        source: Arc<dyn HistorySource>,
        catch_up_on_match_start: bool,
    ) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            event_bus,
            source,
            catch_up_on_match_start,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Applies a snapshot, publishing the scope transition and the
    /// recomputed pool and synergy stats.
    ///
    /// When a match starts and catch-up is enabled, a history fetch is
    /// spawned in the background.
    pub async fn ingest_snapshot(&self, snapshot: MatchSnapshot) -> ScopeTransition {
        let mut engine = self.engine.write().await;
        let transition = engine.apply_snapshot(snapshot);
        self.publish_transition(&transition);
        self.publish_derived(&engine);
        drop(engine);

        let started = match &transition {
            ScopeTransition::Started(_) => true,
            ScopeTransition::Flushed { current, .. } => current.is_some(),
            ScopeTransition::Unchanged => false,
        };
        if started && self.catch_up_on_match_start {
            self.spawn_catch_up();
        }
        transition
    }

    /// Merges a pushed change batch into the current match's history.
    ///
    /// Returns the match the history belongs to with the reconciliation
    /// counters.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::NoActiveMatch`] if no match is active and
    /// [`CompanionError::StaleMatch`] if the batch names another match. In
    /// both cases nothing is applied.
    pub async fn ingest_changes(
        &self,
        batch: ChangeBatch,
    ) -> Result<(MatchId, Reconciled), CompanionError> {
        let batch_match = batch.match_id.clone();
        let mut engine = self.engine.write().await;
        let outcome = engine.apply_change_batch(batch);
        let active = engine.current_match().is_some();

        match outcome {
            BatchOutcome::Merged {
                match_id,
                fresh,
                summary,
            } => {
                tracing::debug!(
                    %match_id,
                    received = summary.received,
                    accepted = summary.accepted,
                    retained = summary.retained,
                    "change batch merged"
                );
                let _ = self.event_bus.publish(EngineEvent::ChangesMerged {
                    match_id: match_id.clone(),
                    changes: fresh,
                    summary,
                    timestamp: Utc::now(),
                });
                drop(engine);
                Ok((match_id, summary))
            }
            BatchOutcome::Stale if !active => Err(CompanionError::NoActiveMatch),
            BatchOutcome::Stale => {
                let id = batch_match.map(|m| m.to_string()).unwrap_or_default();
                tracing::debug!(match_id = %id, "stale change batch dropped");
                Err(CompanionError::StaleMatch(id))
            }
        }
    }

    /// Flushes all match state on an abandon signal.
    pub async fn abandon(&self, signal: AbandonSignal) -> ScopeTransition {
        tracing::info!(
            match_id = ?signal.match_id.as_ref().map(ToString::to_string),
            reason = %signal.reason,
            "match abandoned"
        );
        let mut engine = self.engine.write().await;
        let transition = engine.abandon(&signal);
        self.publish_transition(&transition);
        self.publish_derived(&engine);
        drop(engine);
        transition
    }

    /// Flushes all match state on an explicit clear request.
    pub async fn clear(&self) -> ScopeTransition {
        let mut engine = self.engine.write().await;
        let transition = engine.clear();
        self.publish_transition(&transition);
        self.publish_derived(&engine);
        drop(engine);
        transition
    }

    /// Installs new reference data and publishes the recomputed stats.
    pub async fn set_reference(&self, reference: Arc<ReferenceTable>) {
        let mut engine = self.engine.write().await;
        engine.set_reference(reference);
        self.publish_derived(&engine);
    }

    /// Fetches the active match's history and folds it into the log.
    ///
    /// A response that arrives after the match was flushed or replaced is
    /// discarded and reported as [`CatchUpOutcome::Stale`].
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::NoActiveMatch`] if no match is active and
    /// [`CompanionError::HistoryFetch`] if the pull source fails.
    pub async fn catch_up(&self) -> Result<CatchUpOutcome, CompanionError> {
        let ticket = self
            .engine
            .read()
            .await
            .begin_catch_up()
            .ok_or(CompanionError::NoActiveMatch)?;

        let request = HistoryRequest::full(ticket.match_id.clone());
        let response = match self.source.fetch(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(match_id = %ticket.match_id, error = %err, "catch-up fetch failed");
                let _ = self.event_bus.publish(EngineEvent::CatchUpDiscarded {
                    match_id: ticket.match_id,
                    reason: DiscardReason::FetchFailed,
                    timestamp: Utc::now(),
                });
                return Err(err);
            }
        };

        let mut engine = self.engine.write().await;
        let outcome = engine.complete_catch_up(&ticket, response);

        match &outcome {
            CatchUpOutcome::Applied(summary) => {
                tracing::info!(
                    match_id = %ticket.match_id,
                    received = summary.received,
                    accepted = summary.accepted,
                    retained = summary.retained,
                    "catch-up applied"
                );
                let _ = self.event_bus.publish(EngineEvent::HistoryReplaced {
                    match_id: ticket.match_id,
                    summary: *summary,
                    timestamp: Utc::now(),
                });
            }
            CatchUpOutcome::Stale(reason) => {
                tracing::info!(match_id = %ticket.match_id, ?reason, "stale catch-up discarded");
                let _ = self.event_bus.publish(EngineEvent::CatchUpDiscarded {
                    match_id: ticket.match_id,
                    reason: *reason,
                    timestamp: Utc::now(),
                });
            }
        }
        drop(engine);
        Ok(outcome)
    }

    /// Runs [`Self::catch_up`] on a background task.
    pub fn spawn_catch_up(&self) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.catch_up().await {
                tracing::debug!(error = %err, "background catch-up ended without applying");
            }
        })
    }

    /// Runs `f` against the engine under the read lock.
    ///
    /// Used by readers that need several views of one consistent state.
    pub async fn read<R>(&self, f: impl FnOnce(&MatchEngine) -> R) -> R {
        f(&*self.engine.read().await)
    }

    /// Point-in-time overview of the engine.
    pub async fn status(&self) -> MatchStatus {
        self.engine.read().await.status()
    }

    /// History newest first, filtered.
    pub async fn changes(&self, query: &ChangeQuery) -> Vec<ChangeEvent> {
        self.engine.read().await.query_changes(query)
    }

    /// Current pool counts.
    pub async fn pool(&self) -> PoolCounts {
        self.engine.read().await.pool().clone()
    }

    /// Current synergy stats, most available first.
    pub async fn synergies(&self) -> Vec<SynergyPoolStat> {
        self.engine.read().await.synergies().to_vec()
    }

    /// Shop appearance odds of one hero at every level.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::UnknownUnit`] if the hero is not in the
    /// reference table.
    pub async fn odds(&self, unit_id: UnitId) -> Result<Vec<LevelOdds>, CompanionError> {
        let engine = self.engine.read().await;
        if engine.reference().hero(unit_id).is_none() {
            return Err(CompanionError::UnknownUnit(unit_id.to_string()));
        }
        Ok(engine.odds_by_level(unit_id))
    }

    /// Next-reroll odds for the heroes a player owns.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::NoActiveMatch`] without a snapshot and
    /// [`CompanionError::UnknownPlayer`] if the player is not on any board.
    pub async fn shop_odds(
        &self,
        account_id: AccountId,
        shop_units: &[UnitId],
        level: u32,
    ) -> Result<Vec<HeroOdds>, CompanionError> {
        let engine = self.engine.read().await;
        if engine.snapshot().is_none() {
            return Err(CompanionError::NoActiveMatch);
        }
        engine
            .shop_odds(account_id, shop_units, level)
            .ok_or(CompanionError::UnknownPlayer(account_id))
    }

    fn publish_transition(&self, transition: &ScopeTransition) {
        match transition {
            ScopeTransition::Unchanged => {}
            ScopeTransition::Started(match_id) => {
                tracing::info!(%match_id, "match started");
                let _ = self.event_bus.publish(EngineEvent::MatchStarted {
                    match_id: match_id.clone(),
                    timestamp: Utc::now(),
                });
            }
            ScopeTransition::Flushed {
                previous,
                current,
                reason,
            } => {
                tracing::info!(
                    previous = ?previous.as_ref().map(ToString::to_string),
                    current = ?current.as_ref().map(ToString::to_string),
                    ?reason,
                    "match state flushed"
                );
                let _ = self.event_bus.publish(EngineEvent::MatchFlushed {
                    previous: previous.clone(),
                    current: current.clone(),
                    reason: *reason,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    fn publish_derived(&self, engine: &MatchEngine) {
        let match_id = engine.current_match().cloned();
        let _ = self.event_bus.publish(EngineEvent::PoolUpdated {
            match_id: match_id.clone(),
            pool: engine.pool().clone(),
            timestamp: Utc::now(),
        });
        let _ = self.event_bus.publish(EngineEvent::SynergiesUpdated {
            match_id,
            synergies: engine.synergies().to_vec(),
            timestamp: Utc::now(),
        });
    }
}
