//! Per-synergy rollup of the shared pool.
//!
//! Sums the pool of every hero carrying a synergy keyword, so a consumer can
//! see how contested a whole archetype is rather than a single hero.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::{KeywordId, PoolCounts, ReferenceTable, pool_size_for_tier};

/// Keywords that never form a playable synergy (mega synergies and
/// Primordial). They are left out of the rollup.
pub const INACTIVE_SYNERGY_KEYWORDS: [KeywordId; 6] = [
    KeywordId(26),
    KeywordId(28),
    KeywordId(29),
    KeywordId(31),
    KeywordId(32),
    KeywordId(33),
];

/// Name reported for keywords missing from the synergy catalog.
const UNKNOWN_SYNERGY: &str = "Unknown";

/// Pool depletion of one synergy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynergyPoolStat {
    /// Synergy keyword.
    pub keyword: KeywordId,
    /// Display name of the synergy.
    pub synergy_name: String,
    /// Full pool of every hero with this keyword.
    pub total_pool: u32,
    /// Undrafted copies of those heroes.
    pub remaining_pool: u32,
    /// `total_pool - remaining_pool`.
    pub used_pool: u32,
    /// `100 * remaining_pool / total_pool`.
    pub percentage_remaining: f64,
}

#[derive(Default)]
struct Totals {
    total: u32,
    remaining: u32,
}

/// Rolls `pool` up by synergy keyword.
///
/// The full pool of each hero comes from its draft tier and the remaining
/// copies from `pool`; a hero absent from `pool` contributes no remaining
/// copies. Keywords without any pool are skipped. The result is ordered by
/// `remaining_pool`, largest first, with ties broken by keyword id.
#[must_use]
pub fn calculate_synergy_pool_stats(pool: &PoolCounts, reference: &ReferenceTable) -> Vec<SynergyPoolStat> {
    let mut totals: BTreeMap<KeywordId, Totals> = BTreeMap::new();

    for hero in reference.heroes() {
        let total = pool_size_for_tier(hero.draft_tier);
        let remaining = pool.remaining(hero.id);
        let keywords: BTreeSet<KeywordId> = hero
            .keywords
            .iter()
            .copied()
            .filter(|k| !INACTIVE_SYNERGY_KEYWORDS.contains(k))
            .collect();
        for keyword in keywords {
            let entry = totals.entry(keyword).or_default();
            entry.total += total;
            entry.remaining += remaining;
        }
    }

    let mut stats: Vec<SynergyPoolStat> = totals
        .into_iter()
        .filter(|(_, t)| t.total > 0)
        .map(|(keyword, t)| {
            let synergy_name = reference
                .synergies()
                .name(keyword)
                .unwrap_or(UNKNOWN_SYNERGY)
                .to_string();
            SynergyPoolStat {
                keyword,
                synergy_name,
                total_pool: t.total,
                remaining_pool: t.remaining,
                used_pool: t.total.saturating_sub(t.remaining),
                percentage_remaining: f64::from(t.remaining) * 100.0 / f64::from(t.total),
            }
        })
        .collect();

    // BTreeMap iteration already orders by keyword, so a stable sort keeps
    // ties in keyword order.
    stats.sort_by(|a, b| b.remaining_pool.cmp(&a.remaining_pool));
    stats
}
