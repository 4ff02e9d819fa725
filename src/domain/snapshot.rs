//! Full-state match snapshots.
//!
//! A [`MatchSnapshot`] describes every player's board at one instant and
//! replaces the previous snapshot wholesale. Nothing in the engine assumes
//! identity between units of consecutive snapshots beyond their [`UnitId`].

use std::fmt;

use serde::{Deserialize, Serialize};

use super::change_event::EventTime;
use super::{AccountId, MatchId, UnitId};

/// Upgrade tier of a unit on a board ("stars").
///
/// Only ranks 1 to 3 exist. Any other value is rejected when the snapshot is
/// parsed rather than silently clamped, so every [`Rank`] the engine sees is
/// valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rank {
    /// A single base copy.
    #[default]
    One,
    /// Three base copies combined.
    Two,
    /// Nine base copies combined.
    Three,
}

impl Rank {
    /// Number of base copies this rank withdraws from the shared pool.
    #[must_use]
    pub const fn pool_units(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 3,
            Self::Three => 9,
        }
    }

    /// Returns the numeric star count.
    #[must_use]
    pub const fn stars(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
        }
    }
}

/// Error returned when a rank outside `1..=3` is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unit rank must be 1, 2 or 3 (got {0})")]
pub struct RankOutOfRange(pub u8);

impl TryFrom<u8> for Rank {
    type Error = RankOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            other => Err(RankOutOfRange(other)),
        }
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> Self {
        rank.stars()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stars())
    }
}

/// Board or bench coordinate. Carried for display only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Column.
    pub x: i32,
    /// Row; negative rows are the bench.
    pub y: i32,
}

/// One unit on a player's board or bench.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Hero type.
    pub unit_id: UnitId,
    /// Upgrade tier. Absent ranks are treated as rank 1.
    #[serde(default)]
    pub rank: Rank,
    /// Board coordinate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl Unit {
    /// Creates a unit without a position.
    #[must_use]
    pub const fn new(unit_id: UnitId, rank: Rank) -> Self {
        Self {
            unit_id,
            rank,
            position: None,
        }
    }
}

/// All units currently owned by one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBoard {
    /// Participant account.
    pub account_id: AccountId,
    /// Every unit on the board and bench.
    #[serde(default)]
    pub units: Vec<Unit>,
}

/// One complete match update.
///
/// A `match_id` of `None` means "no active match".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Match identity; changes only at match start or restart.
    #[serde(default)]
    pub match_id: Option<MatchId>,
    /// Boards of every participant.
    #[serde(default)]
    pub players: Vec<PlayerBoard>,
    /// Advisory wall-clock time of the snapshot.
    #[serde(default, skip_serializing_if = "EventTime::is_missing")]
    pub timestamp: EventTime,
}

impl MatchSnapshot {
    /// Returns the board of the given account, if it is part of this snapshot.
    #[must_use]
    pub fn board(&self, account_id: AccountId) -> Option<&PlayerBoard> {
        self.players.iter().find(|p| p.account_id == account_id)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn rank_pool_units() {
        assert_eq!(Rank::One.pool_units(), 1);
        assert_eq!(Rank::Two.pool_units(), 3);
        assert_eq!(Rank::Three.pool_units(), 9);
    }

    #[test]
    fn rank_outside_range_is_rejected() {
        assert_eq!(Rank::try_from(0), Err(RankOutOfRange(0)));
        assert_eq!(Rank::try_from(4), Err(RankOutOfRange(4)));
        let parsed = serde_json::from_str::<Unit>(r#"{"unit_id": 4, "rank": 4}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn missing_rank_defaults_to_one() {
        let Ok(unit) = serde_json::from_str::<Unit>(r#"{"unit_id": 4}"#) else {
            panic!("unit should parse");
        };
        assert_eq!(unit.rank, Rank::One);
    }

    #[test]
    fn snapshot_parses_wire_shape() {
        let json = r#"{
            "match_id": "m-1",
            "players": [
                {"account_id": 11, "units": [
                    {"unit_id": 4, "rank": 2, "position": {"x": 1, "y": 2}},
                    {"unit_id": 9, "rank": 1}
                ]},
                {"account_id": 12}
            ],
            "timestamp": 1700000000000
        }"#;
        let Ok(snapshot) = serde_json::from_str::<MatchSnapshot>(json) else {
            panic!("snapshot should parse");
        };
        assert_eq!(snapshot.match_id, Some(MatchId::from("m-1")));
        assert_eq!(snapshot.players.len(), 2);
        let Some(board) = snapshot.board(AccountId(11)) else {
            panic!("board for account 11");
        };
        assert_eq!(board.units.len(), 2);
        assert!(snapshot.board(AccountId(12)).is_some_and(|b| b.units.is_empty()));
    }

    #[test]
    fn null_match_id_means_no_match() {
        let Ok(snapshot) = serde_json::from_str::<MatchSnapshot>(r#"{"match_id": null}"#) else {
            panic!("snapshot should parse");
        };
        assert!(snapshot.match_id.is_none());
        assert!(snapshot.players.is_empty());
    }
}
