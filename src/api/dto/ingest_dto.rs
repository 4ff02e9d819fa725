//! Ingest DTOs: snapshots, change batches and abandon signals.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AbandonSignal, AccountId, ChangeBatch, ChangeEvent, EventTime, MatchId, MatchSnapshot,
    PlayerBoard, Position, Rank, RankOutOfRange, Unit, UnitId,
};

/// Board coordinate.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct PositionDto {
    /// Column.
    pub x: i32,
    /// Row; negative rows are the bench.
    pub y: i32,
}

/// One unit on a board.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UnitDto {
    /// Hero type id.
    pub unit_id: i32,
    /// Star rank (1, 2 or 3). Defaults to 1.
    #[serde(default)]
    pub rank: Option<u8>,
    /// Board coordinate.
    #[serde(default)]
    pub position: Option<PositionDto>,
}

impl TryFrom<UnitDto> for Unit {
    type Error = RankOutOfRange;

    fn try_from(dto: UnitDto) -> Result<Self, Self::Error> {
        let rank = dto.rank.map_or(Ok(Rank::One), Rank::try_from)?;
        Ok(Self {
            unit_id: UnitId(dto.unit_id),
            rank,
            position: dto.position.map(|p| Position { x: p.x, y: p.y }),
        })
    }
}

/// All units of one player.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlayerBoardDto {
    /// Player account id.
    pub account_id: u64,
    /// Board and bench units.
    #[serde(default)]
    pub units: Vec<UnitDto>,
}

/// Request body for `POST /ingest/snapshot`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SnapshotRequest {
    /// Match identity; `null` means no active match.
    #[serde(default)]
    pub match_id: Option<String>,
    /// Boards of every participant.
    #[serde(default)]
    pub players: Vec<PlayerBoardDto>,
    /// Epoch milliseconds or ISO 8601 text.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub timestamp: EventTime,
}

impl TryFrom<SnapshotRequest> for MatchSnapshot {
    type Error = RankOutOfRange;

    fn try_from(req: SnapshotRequest) -> Result<Self, Self::Error> {
        let players = req
            .players
            .into_iter()
            .map(|p| {
                let units = p
                    .units
                    .into_iter()
                    .map(Unit::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PlayerBoard {
                    account_id: AccountId(p.account_id),
                    units,
                })
            })
            .collect::<Result<Vec<_>, RankOutOfRange>>()?;
        Ok(Self {
            match_id: req.match_id.map(MatchId::from),
            players,
            timestamp: req.timestamp,
        })
    }
}

/// Request body for `POST /ingest/changes`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChangeBatchRequest {
    /// Match the batch belongs to.
    #[serde(default)]
    pub match_id: Option<String>,
    /// Player the batch was produced for.
    #[serde(default)]
    pub account_id: Option<u64>,
    /// Change events; unknown fields are kept.
    #[serde(default)]
    #[schema(value_type = Vec<Object>)]
    pub changes: Vec<ChangeEvent>,
    /// Send time.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub timestamp: EventTime,
}

impl From<ChangeBatchRequest> for ChangeBatch {
    fn from(req: ChangeBatchRequest) -> Self {
        Self {
            match_id: req.match_id.map(MatchId::from),
            account_id: req.account_id.map(AccountId),
            changes: req.changes,
            timestamp: req.timestamp,
        }
    }
}

/// Request body for `POST /ingest/abandon`.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AbandonRequest {
    /// Match that was abandoned.
    #[serde(default)]
    pub match_id: Option<String>,
    /// Free-form reason.
    #[serde(default)]
    pub reason: String,
    /// Signal time.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub timestamp: EventTime,
}

impl From<AbandonRequest> for AbandonSignal {
    fn from(req: AbandonRequest) -> Self {
        Self {
            match_id: req.match_id.map(MatchId::from),
            reason: req.reason,
            timestamp: req.timestamp,
        }
    }
}

/// Response body for `POST /ingest/changes`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChangesIngestedResponse {
    /// Match the history belongs to.
    pub match_id: String,
    /// Reconciliation counters.
    pub summary: super::ReconciledDto,
}
