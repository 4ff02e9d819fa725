//! Deduplicated change history of the current match.
//!
//! [`ChangeLog`] is fed by two untrusted sources that may overlap,
//! duplicate or race: the push channel ([`ChangeLog::merge`]) and the pull
//! source's catch-up response ([`ChangeLog::replace`]). Both paths run the
//! union of the incoming events and the current history through
//! [`dedup`], order the result chronologically and keep only the most
//! recent `capacity` entries.
//!
//! `replace` does not discard what `merge` accumulated: the pull source may
//! lag behind the push channel, so history gathered while a fetch was in
//! flight is folded into the fetched set instead of being overwritten.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::change_event::{ChangeKey, dedup};
use super::{AccountId, ChangeEvent, ChangeKind};

/// Default bound on the number of retained events.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciled {
    /// Events in the call's input.
    pub received: usize,
    /// Input events that were not already known and are still retained.
    pub accepted: usize,
    /// Oldest events dropped to respect the capacity.
    pub evicted: usize,
    /// History length after the call.
    pub retained: usize,
}

/// Filter for reading the history.
#[derive(Debug, Clone, Default)]
pub struct ChangeQuery {
    /// Only events of these accounts; `None` means every account.
    pub account_ids: Option<HashSet<AccountId>>,
    /// Only events of these kinds; `None` means every kind.
    pub kinds: Option<HashSet<ChangeKind>>,
    /// Maximum number of events returned.
    pub limit: Option<usize>,
}

impl ChangeQuery {
    fn matches(&self, event: &ChangeEvent) -> bool {
        let account_ok = self.account_ids.as_ref().is_none_or(|ids| {
            event
                .account_id
                .is_some_and(|account| ids.contains(&account))
        });
        let kind_ok = self
            .kinds
            .as_ref()
            .is_none_or(|kinds| kinds.contains(&event.kind));
        account_ok && kind_ok
    }
}

/// Bounded, deduplicated, chronologically ordered change history.
#[derive(Debug)]
pub struct ChangeLog {
    entries: Vec<ChangeEvent>,
    capacity: usize,
    last_update: Option<DateTime<Utc>>,
}

impl ChangeLog {
    /// Creates an empty log retaining at most `capacity` events (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
            last_update: None,
        }
    }

    /// Appends a pushed batch to the history.
    ///
    /// Idempotent: merging the same batch twice leaves the same history as
    /// merging it once.
    pub fn merge(&mut self, events: Vec<ChangeEvent>) -> Reconciled {
        let received = events.len();
        let known = self.keys();
        let mut candidates = std::mem::take(&mut self.entries);
        candidates.extend(events);
        self.settle(candidates, received, &known)
    }

    /// Installs an authoritative history fetched from the pull source.
    ///
    /// The fetched events come first, so for duplicates the fetched copy is
    /// the one kept; everything already in the log is folded in behind
    /// them.
    pub fn replace(&mut self, events: Vec<ChangeEvent>) -> Reconciled {
        let received = events.len();
        let known = self.keys();
        let mut candidates = events;
        candidates.append(&mut self.entries);
        self.settle(candidates, received, &known)
    }

    /// Discards the whole history.
    pub fn flush(&mut self) {
        self.entries.clear();
        self.last_update = None;
    }

    fn keys(&self) -> HashSet<ChangeKey> {
        self.entries.iter().map(ChangeEvent::key).collect()
    }

    fn settle(
        &mut self,
        candidates: Vec<ChangeEvent>,
        received: usize,
        known: &HashSet<ChangeKey>,
    ) -> Reconciled {
        let mut unique = dedup(candidates);
        unique.sort_by(|a, b| a.timestamp.chronological(&b.timestamp));

        let evicted = unique.len().saturating_sub(self.capacity);
        unique.drain(..evicted);

        // An event evicted in the same pass it arrived was never accepted.
        let accepted = unique.iter().filter(|e| !known.contains(&e.key())).count();
        self.entries = unique;
        self.last_update = Some(Utc::now());

        Reconciled {
            received,
            accepted,
            evicted,
            retained: self.entries.len(),
        }
    }

    /// History in chronological order; events without a usable timestamp
    /// come last.
    #[must_use]
    pub fn entries(&self) -> &[ChangeEvent] {
        &self.entries
    }

    /// Reads the history newest first, applying `query`.
    ///
    /// Events without a usable timestamp are listed after all timed events.
    #[must_use]
    pub fn query(&self, query: &ChangeQuery) -> Vec<ChangeEvent> {
        let (timed, untimed): (Vec<&ChangeEvent>, Vec<&ChangeEvent>) = self
            .entries
            .iter()
            .partition(|e| e.timestamp.sort_millis().is_some());
        timed
            .into_iter()
            .rev()
            .chain(untimed)
            .filter(|e| query.matches(e))
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Number of retained events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of retained events.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Time of the last merge or replace since the last flush.
    #[must_use]
    pub const fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{EventTime, KeywordId, UnitId};

    fn bought(ts: i64, account: u64, unit: i32) -> ChangeEvent {
        ChangeEvent::new(ChangeKind::Bought, AccountId(account), EventTime::millis(ts))
            .with_unit(UnitId(unit))
    }

    fn keys(log: &ChangeLog) -> HashSet<String> {
        log.entries().iter().map(|e| e.key().to_string()).collect()
    }

    #[test]
    fn merging_same_batch_twice_is_idempotent() {
        let batch = vec![bought(100, 1, 5)];
        let mut log = ChangeLog::default();
        let first = log.merge(batch.clone());
        assert_eq!(first.accepted, 1);
        let second = log.merge(batch);
        assert_eq!(second.accepted, 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn merge_is_idempotent_for_larger_batches() {
        let batch: Vec<_> = (0..20).map(|i| bought(i * 10, (i % 3) as u64, 4)).collect();
        let mut once = ChangeLog::default();
        once.merge(batch.clone());
        let mut twice = ChangeLog::default();
        twice.merge(batch.clone());
        twice.merge(batch);
        assert_eq!(once.entries(), twice.entries());
    }

    #[test]
    fn merge_order_does_not_change_the_event_set() {
        let a = vec![bought(1, 1, 1), bought(2, 1, 2), bought(3, 2, 1)];
        let b = vec![bought(2, 1, 2), bought(4, 3, 3)];

        let mut ab = ChangeLog::default();
        ab.merge(a.clone());
        ab.merge(b.clone());
        let mut ba = ChangeLog::default();
        ba.merge(b);
        ba.merge(a);

        assert_eq!(keys(&ab), keys(&ba));
        assert_eq!(ab.len(), 4);
    }

    #[test]
    fn duplicates_within_one_batch_collapse() {
        let mut log = ChangeLog::default();
        let r = log.merge(vec![bought(1, 1, 1), bought(1, 1, 1), bought(1, 1, 1)]);
        assert_eq!(r.received, 3);
        assert_eq!(r.accepted, 1);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn replace_folds_in_previously_merged_events() {
        let mut log = ChangeLog::default();
        log.merge(vec![bought(1, 1, 1), bought(2, 1, 2), bought(3, 1, 3)]);
        let r = log.replace(Vec::new());
        assert_eq!(r.retained, 3);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn replace_unions_fetched_with_live_events() {
        let mut log = ChangeLog::default();
        log.merge(vec![bought(30, 1, 3)]);
        let r = log.replace(vec![bought(10, 1, 1), bought(20, 1, 2), bought(30, 1, 3)]);
        assert_eq!(r.received, 3);
        assert_eq!(r.accepted, 2);
        let order: Vec<_> = log.entries().iter().filter_map(|e| e.unit_id).collect();
        assert_eq!(order, vec![UnitId(1), UnitId(2), UnitId(3)]);
    }

    #[test]
    fn replace_keeps_the_fetched_copy_of_a_duplicate() {
        let mut live = bought(5, 1, 1);
        live.details.insert("source".to_string(), serde_json::json!("push"));
        let mut fetched = bought(5, 1, 1);
        fetched.details.insert("source".to_string(), serde_json::json!("pull"));

        let mut log = ChangeLog::default();
        log.merge(vec![live]);
        log.replace(vec![fetched.clone()]);
        assert_eq!(log.entries(), &[fetched]);
    }

    #[test]
    fn flush_clears_and_stays_clear() {
        let mut log = ChangeLog::default();
        log.merge(vec![bought(1, 1, 1)]);
        assert!(log.last_update().is_some());
        log.flush();
        assert!(log.is_empty());
        assert!(log.last_update().is_none());
        log.merge(Vec::new());
        assert!(log.is_empty());
    }

    #[test]
    fn capacity_drops_oldest_first() {
        let mut log = ChangeLog::new(3);
        log.merge(vec![bought(40, 1, 4), bought(10, 1, 1)]);
        let r = log.merge(vec![bought(30, 1, 3), bought(20, 1, 2)]);
        assert_eq!(r.evicted, 1);
        assert_eq!(r.retained, 3);
        let kept: Vec<_> = log.entries().iter().filter_map(|e| e.unit_id).collect();
        assert_eq!(kept, vec![UnitId(2), UnitId(3), UnitId(4)]);
    }

    #[test]
    fn re_merging_an_evicted_event_is_not_accepted() {
        let mut log = ChangeLog::new(2);
        let first = log.merge(vec![bought(1, 1, 1), bought(2, 1, 2), bought(3, 1, 3)]);
        assert_eq!(first.accepted, 2);
        assert_eq!(first.evicted, 1);

        let again = log.merge(vec![bought(1, 1, 1)]);
        assert_eq!(again.accepted, 0);
        assert_eq!(again.evicted, 1);
        let kept: Vec<_> = log.entries().iter().filter_map(|e| e.unit_id).collect();
        assert_eq!(kept, vec![UnitId(2), UnitId(3)]);
    }

    #[test]
    fn untimed_events_are_kept_and_sorted_last() {
        let mut untimed = bought(0, 1, 9);
        untimed.timestamp = EventTime::Missing;
        let mut log = ChangeLog::default();
        log.merge(vec![untimed, bought(2, 1, 2), bought(1, 1, 1)]);

        let order: Vec<_> = log.entries().iter().filter_map(|e| e.unit_id).collect();
        assert_eq!(order, vec![UnitId(1), UnitId(2), UnitId(9)]);

        let newest_first: Vec<_> = log
            .query(&ChangeQuery::default())
            .iter()
            .filter_map(|e| e.unit_id)
            .collect();
        assert_eq!(newest_first, vec![UnitId(2), UnitId(1), UnitId(9)]);
    }

    #[test]
    fn query_filters_by_account_kind_and_limit() {
        let mut log = ChangeLog::default();
        log.merge(vec![
            bought(1, 1, 1),
            bought(2, 2, 2),
            ChangeEvent::new(ChangeKind::SynergyAdded, AccountId(1), EventTime::millis(3))
                .with_synergy(KeywordId(7)),
            bought(4, 1, 4),
        ]);

        let query = ChangeQuery {
            account_ids: Some(HashSet::from([AccountId(1)])),
            kinds: Some(HashSet::from([ChangeKind::Bought])),
            limit: None,
        };
        let units: Vec<_> = log.query(&query).iter().filter_map(|e| e.unit_id).collect();
        assert_eq!(units, vec![UnitId(4), UnitId(1)]);

        let limited = log.query(&ChangeQuery {
            limit: Some(2),
            ..ChangeQuery::default()
        });
        assert_eq!(limited.len(), 2);
        assert_eq!(limited.first().and_then(|e| e.unit_id), Some(UnitId(4)));
    }
}
