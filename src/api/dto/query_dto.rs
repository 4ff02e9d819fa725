//! Read-side DTOs: match status, history, pool and synergies.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    AccountId, CatchUpOutcome, ChangeEvent, ChangeKind, ChangeQuery, MatchStatus, PoolCounts,
    ReferenceTable, SynergyPoolStat,
};
use crate::error::CompanionError;

use super::ReconciledDto;

/// Response body for `GET /match`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchStatusResponse {
    /// Active match.
    pub match_id: Option<String>,
    /// Number of flushes since start.
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

impl From<MatchStatus> for MatchStatusResponse {
    fn from(s: MatchStatus) -> Self {
        Self {
            match_id: s.match_id.map(|m| m.to_string()),
            epoch: s.epoch,
            player_count: s.player_count,
            change_count: s.change_count,
            change_capacity: s.change_capacity,
            last_change_update: s.last_change_update,
            reference_heroes: s.reference_heroes,
        }
    }
}

/// Query parameters for `GET /changes`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChangesParams {
    /// Comma-separated account ids to include.
    #[serde(default)]
    pub account_id: Option<String>,
    /// Comma-separated change kinds to include (e.g. `bought,sold`).
    #[serde(default)]
    pub kind: Option<String>,
    /// Maximum number of events.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl ChangesParams {
    /// Converts the parameters into a history query.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::InvalidRequest`] if an account id is not a
    /// number.
    pub fn to_query(&self) -> Result<ChangeQuery, CompanionError> {
        let account_ids = self
            .account_id
            .as_deref()
            .map(|list| {
                split_list(list)
                    .map(|id| {
                        id.parse::<u64>().map(AccountId).map_err(|_| {
                            CompanionError::InvalidRequest(format!("invalid account id: {id}"))
                        })
                    })
                    .collect::<Result<HashSet<_>, _>>()
            })
            .transpose()?;
        let kinds = self
            .kind
            .as_deref()
            .map(|list| split_list(list).map(ChangeKind::from).collect::<HashSet<_>>());
        Ok(ChangeQuery {
            account_ids,
            kinds,
            limit: self.limit,
        })
    }
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// Response body for `GET /changes`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChangesResponse {
    /// Active match.
    pub match_id: Option<String>,
    /// Number of events returned.
    pub count: usize,
    /// Events, newest first.
    #[schema(value_type = Vec<Object>)]
    pub changes: Vec<ChangeEvent>,
}

/// Pool state of one hero.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolCountDto {
    /// Hero type id.
    pub unit_id: i32,
    /// Hero name.
    pub name: Option<String>,
    /// Draft tier.
    pub tier: Option<u8>,
    /// Undrafted copies.
    pub remaining: u32,
    /// Copies in a full pool.
    pub total: u32,
    /// Copies held by players.
    pub used: u32,
}

/// Response body for `GET /pool`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PoolResponse {
    /// Active match.
    pub match_id: Option<String>,
    /// One entry per hero in the reference table, ordered by id.
    pub units: Vec<PoolCountDto>,
}

impl PoolResponse {
    /// Builds the response, labelling heroes from the reference table.
    #[must_use]
    pub fn new(match_id: Option<String>, pool: &PoolCounts, reference: &ReferenceTable) -> Self {
        let units = pool
            .iter()
            .map(|(unit_id, count)| {
                let hero = reference.hero(unit_id);
                PoolCountDto {
                    unit_id: unit_id.0,
                    name: hero.map(|h| h.display_name.clone()),
                    tier: hero.map(|h| h.draft_tier),
                    remaining: count.remaining,
                    total: count.total,
                    used: count.used(),
                }
            })
            .collect();
        Self { match_id, units }
    }
}

/// Pool depletion of one synergy.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SynergyStatDto {
    /// Synergy keyword id.
    pub keyword: u32,
    /// Synergy name.
    pub synergy_name: String,
    /// Full pool of every hero with this keyword.
    pub total_pool: u32,
    /// Undrafted copies of those heroes.
    pub remaining_pool: u32,
    /// Drafted copies.
    pub used_pool: u32,
    /// Percentage still undrafted.
    pub percentage_remaining: f64,
}

impl From<&SynergyPoolStat> for SynergyStatDto {
    fn from(s: &SynergyPoolStat) -> Self {
        Self {
            keyword: s.keyword.0,
            synergy_name: s.synergy_name.clone(),
            total_pool: s.total_pool,
            remaining_pool: s.remaining_pool,
            used_pool: s.used_pool,
            percentage_remaining: s.percentage_remaining,
        }
    }
}

/// Response body for `GET /synergies`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SynergiesResponse {
    /// Active match.
    pub match_id: Option<String>,
    /// Synergies ordered by remaining pool, largest first.
    pub synergies: Vec<SynergyStatDto>,
}

/// Response body for `POST /catch-up`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatchUpResponse {
    /// `"applied"` or `"stale"`.
    pub status: String,
    /// Why a stale response was dropped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Reconciliation counters, when applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReconciledDto>,
}

impl From<CatchUpOutcome> for CatchUpResponse {
    fn from(outcome: CatchUpOutcome) -> Self {
        match outcome {
            CatchUpOutcome::Applied(summary) => Self {
                status: "applied".to_string(),
                reason: None,
                summary: Some(summary.into()),
            },
            CatchUpOutcome::Stale(reason) => Self {
                status: "stale".to_string(),
                reason: serde_json::to_value(reason)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string)),
                summary: None,
            },
        }
    }
}
