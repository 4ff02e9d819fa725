//! Shared unit pool accounting.
//!
//! All eight players draft from one finite pool per hero. The pool size is
//! fixed by the hero's draft tier, and every unit on any board withdraws
//! base copies according to its rank. [`calculate_pool_counts`] recomputes
//! the whole pool from one snapshot and never reads its previous output, so
//! a dropped or reordered snapshot is corrected by the next one.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{PlayerBoard, ReferenceTable, UnitId};

/// Number of copies of each hero in the pool, by draft tier.
#[must_use]
pub const fn pool_size_for_tier(tier: u8) -> u32 {
    match tier {
        1 => 30,
        2 => 20,
        3 => 18,
        4 => 12,
        5 => 10,
        _ => 0,
    }
}

/// Remaining and total copies of one hero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolCount {
    /// Copies still undrafted (never negative, never above `total`).
    pub remaining: u32,
    /// Copies in a full pool.
    pub total: u32,
}

impl PoolCount {
    /// Copies currently held by players (clamped at `total`).
    #[must_use]
    pub const fn used(&self) -> u32 {
        self.total - self.remaining
    }
}

/// Pool state of every hero in the reference table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PoolCounts(BTreeMap<UnitId, PoolCount>);

impl PoolCounts {
    /// Pool count of one hero.
    #[must_use]
    pub fn get(&self, unit_id: UnitId) -> Option<&PoolCount> {
        self.0.get(&unit_id)
    }

    /// Remaining copies of one hero, 0 when unknown.
    #[must_use]
    pub fn remaining(&self, unit_id: UnitId) -> u32 {
        self.0.get(&unit_id).map_or(0, |c| c.remaining)
    }

    /// Iterates counts ordered by unit id.
    pub fn iter(&self) -> impl Iterator<Item = (UnitId, &PoolCount)> {
        self.0.iter().map(|(id, count)| (*id, count))
    }

    /// Number of heroes covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no heroes are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pool as it will look for the next reroll.
    ///
    /// Units currently offered in the shop are out of the pool until they
    /// are rerolled away, so each offered entry withdraws one more copy
    /// (floored at zero). Empty slots and unknown units are ignored. Returns
    /// a new value; `self` is left untouched.
    #[must_use]
    pub fn excluding_shop(&self, shop_units: &[UnitId]) -> Self {
        let mut next = self.clone();
        for unit_id in shop_units {
            if let Some(count) = next.0.get_mut(unit_id) {
                count.remaining = count.remaining.saturating_sub(1);
            }
        }
        next
    }
}

impl FromIterator<(UnitId, PoolCount)> for PoolCounts {
    fn from_iter<I: IntoIterator<Item = (UnitId, PoolCount)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Base copies withdrawn from the pool per hero across all boards.
#[must_use]
pub fn consumed_units(players: &[PlayerBoard]) -> HashMap<UnitId, u32> {
    let mut consumed: HashMap<UnitId, u32> = HashMap::new();
    for unit in players.iter().flat_map(|p| &p.units) {
        let entry = consumed.entry(unit.unit_id).or_default();
        *entry = entry.saturating_add(unit.rank.pool_units());
    }
    consumed
}

/// Recomputes the pool of every hero in `reference` from the boards of one
/// snapshot.
///
/// Heroes nobody owns appear with `remaining == total`; over-drafted heroes
/// are clamped to `remaining == 0`. Units missing from the reference table
/// are ignored. An empty table yields an empty result.
#[must_use]
pub fn calculate_pool_counts(players: &[PlayerBoard], reference: &ReferenceTable) -> PoolCounts {
    if reference.is_empty() {
        return PoolCounts::default();
    }
    let consumed = consumed_units(players);
    reference
        .heroes()
        .map(|hero| {
            let total = pool_size_for_tier(hero.draft_tier);
            let used = consumed.get(&hero.id).copied().unwrap_or(0);
            let count = PoolCount {
                remaining: total.saturating_sub(used),
                total,
            };
            (hero.id, count)
        })
        .collect()
}
