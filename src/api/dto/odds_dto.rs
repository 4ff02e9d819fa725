//! Shop odds DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{HeroOdds, LevelOdds};

/// Query parameters for `GET /odds/{unit_id}`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OddsParams {
    /// Player level to highlight; clamped to 1 to 10.
    #[serde(default)]
    pub level: Option<u32>,
}

/// Probability at one level.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct LevelOddsDto {
    /// Player level.
    pub level: u32,
    /// Chance to appear at least once in a reroll.
    pub probability: f64,
}

impl From<&LevelOdds> for LevelOddsDto {
    fn from(o: &LevelOdds) -> Self {
        Self {
            level: o.level,
            probability: o.probability,
        }
    }
}

/// Response body for `GET /odds/{unit_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OddsResponse {
    /// Hero type id.
    pub unit_id: i32,
    /// Requested level after clamping, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    /// Probability at the requested level.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    /// Probability at every level.
    pub by_level: Vec<LevelOddsDto>,
}

/// Request body for `POST /shop-odds`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShopOddsRequest {
    /// Player whose owned heroes are evaluated.
    pub account_id: u64,
    /// Unit ids currently offered; `-1` marks an empty slot.
    #[serde(default)]
    pub shop_units: Vec<i32>,
    /// Player level; clamped to 1 to 10.
    pub level: u32,
}

/// Next-reroll odds of one owned hero.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HeroOddsDto {
    /// Hero type id.
    pub unit_id: i32,
    /// Whether the hero is in the current offer.
    pub in_shop: bool,
    /// Chance at the player's level.
    pub probability: f64,
    /// Chance at every level.
    pub by_level: Vec<LevelOddsDto>,
}

impl From<&HeroOdds> for HeroOddsDto {
    fn from(o: &HeroOdds) -> Self {
        Self {
            unit_id: o.unit_id.0,
            in_shop: o.in_shop,
            probability: o.probability,
            by_level: o.by_level.iter().map(LevelOddsDto::from).collect(),
        }
    }
}

/// Response body for `POST /shop-odds`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShopOddsResponse {
    /// Player evaluated.
    pub account_id: u64,
    /// Player level used.
    pub level: u32,
    /// Owned heroes, ordered by id.
    pub heroes: Vec<HeroOddsDto>,
}
