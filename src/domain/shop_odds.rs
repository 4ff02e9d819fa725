//! Shop appearance probabilities.
//!
//! Pure functions over [`PoolCounts`] and the static tier odds table. A
//! reroll offers [`SHOP_SLOTS`] units; each slot first picks a tier with the
//! level's tier odds, then a hero of that tier weighted by its remaining
//! copies. Slots are modelled as independent draws, i.e. the chance of
//! seeing a hero at least once is `1 - (1 - p_slot)^5`. This approximation
//! is the displayed figure and is kept as is.

use std::collections::BTreeSet;

use serde::Serialize;

use super::{PoolCounts, Rank, ReferenceTable, Unit, UnitId};

/// Units offered per reroll.
pub const SHOP_SLOTS: i32 = 5;

/// Highest player level.
pub const MAX_LEVEL: u32 = 10;

/// Tier odds per player level. Row `n` is level `n + 1`; columns are tiers
/// 1 to 5. Every row sums to 1.
const TIER_ODDS: [[f64; 5]; MAX_LEVEL as usize] = [
    [0.80, 0.20, 0.00, 0.00, 0.00],
    [0.70, 0.30, 0.00, 0.00, 0.00],
    [0.55, 0.35, 0.10, 0.00, 0.00],
    [0.45, 0.40, 0.15, 0.00, 0.00],
    [0.35, 0.40, 0.25, 0.00, 0.00],
    [0.25, 0.35, 0.35, 0.05, 0.00],
    [0.20, 0.30, 0.40, 0.10, 0.00],
    [0.18, 0.24, 0.35, 0.20, 0.03],
    [0.15, 0.21, 0.30, 0.28, 0.06],
    [0.12, 0.18, 0.28, 0.32, 0.10],
];

/// Probability that one shop slot rolls a unit of `tier` at `level`.
///
/// `level` is clamped to `1..=10`; unknown tiers have probability 0.
#[must_use]
pub fn tier_odds(level: u32, tier: u8) -> f64 {
    let row = level.clamp(1, MAX_LEVEL) - 1;
    let Some(column) = usize::from(tier).checked_sub(1) else {
        return 0.0;
    };
    TIER_ODDS
        .get(row as usize)
        .and_then(|odds| odds.get(column))
        .copied()
        .unwrap_or(0.0)
}

/// Probability that `unit_id` appears at least once in a reroll at `level`.
///
/// Returns 0 for units missing from the reference table and when the
/// unit's tier has no copies left.
#[must_use]
pub fn shop_probability(
    unit_id: UnitId,
    level: u32,
    pool: &PoolCounts,
    reference: &ReferenceTable,
) -> f64 {
    let Some(tier) = reference.tier_of(unit_id) else {
        return 0.0;
    };
    let tier_weight = tier_odds(level, tier);
    if tier_weight == 0.0 {
        return 0.0;
    }

    let tier_remaining: u32 = pool
        .iter()
        .filter(|(id, _)| reference.tier_of(*id) == Some(tier))
        .map(|(_, count)| count.remaining)
        .sum();
    if tier_remaining == 0 {
        return 0.0;
    }

    let share = f64::from(pool.remaining(unit_id)) / f64::from(tier_remaining);
    let per_slot = tier_weight * share;
    1.0 - (1.0 - per_slot).powi(SHOP_SLOTS)
}

/// Probability for one level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LevelOdds {
    /// Player level.
    pub level: u32,
    /// Chance to appear in one reroll.
    pub probability: f64,
}

/// [`shop_probability`] for every level from 1 to 10.
#[must_use]
pub fn odds_by_level(unit_id: UnitId, pool: &PoolCounts, reference: &ReferenceTable) -> Vec<LevelOdds> {
    (1..=MAX_LEVEL)
        .map(|level| LevelOdds {
            level,
            probability: shop_probability(unit_id, level, pool, reference),
        })
        .collect()
}

/// Next-reroll chance for one hero a player owns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeroOdds {
    /// Hero type.
    pub unit_id: UnitId,
    /// Whether the hero is in the current offer.
    pub in_shop: bool,
    /// Chance at the player's current level.
    pub probability: f64,
    /// Chance at every level.
    pub by_level: Vec<LevelOdds>,
}

/// Next-reroll odds for the heroes a player owns.
///
/// Underlords, contraptions and heroes the player already holds at rank 3
/// are left out. Odds are computed against the pool with the current offer
/// withdrawn; a hero that is in the offer right now reads 0.
#[must_use]
pub fn shop_odds(
    owned: &[Unit],
    shop_units: &[UnitId],
    level: u32,
    pool: &PoolCounts,
    reference: &ReferenceTable,
) -> Vec<HeroOdds> {
    let offered: Vec<UnitId> = shop_units
        .iter()
        .copied()
        .filter(|id| *id != UnitId::EMPTY_SLOT)
        .collect();
    let next_pool = pool.excluding_shop(&offered);

    let maxed: BTreeSet<UnitId> = owned
        .iter()
        .filter(|u| u.rank == Rank::Three)
        .map(|u| u.unit_id)
        .collect();
    let heroes: BTreeSet<UnitId> = owned
        .iter()
        .map(|u| u.unit_id)
        .filter(|id| id.is_hero() && !maxed.contains(id))
        .collect();

    heroes
        .into_iter()
        .map(|unit_id| {
            let in_shop = offered.contains(&unit_id);
            let by_level: Vec<LevelOdds> = if in_shop {
                (1..=MAX_LEVEL)
                    .map(|level| LevelOdds {
                        level,
                        probability: 0.0,
                    })
                    .collect()
            } else {
                odds_by_level(unit_id, &next_pool, reference)
            };
            let probability = by_level
                .iter()
                .find(|o| o.level == level.clamp(1, MAX_LEVEL))
                .map_or(0.0, |o| o.probability);
            HeroOdds {
                unit_id,
                in_shop,
                probability,
                by_level,
            }
        })
        .collect()
}
