//! Type-safe identifiers for matches, players, units and synergies.
//!
//! The backend assigns every identifier; these newtypes only keep them from
//! being confused with one another. [`MatchId`] is opaque text, the others
//! wrap the integer ids the backend emits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of one match.
///
/// Stable for the lifetime of a match and replaced only when a match starts
/// or restarts. Used by [`super::MatchScope`] to detect match transitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(String);

impl MatchId {
    /// Creates a `MatchId` from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MatchId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MatchId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Hero type identifier.
///
/// Identifies the *kind* of unit, not an instance: every copy of the same
/// hero on every board shares one `UnitId`. The shop uses `-1` for an empty
/// slot (see [`UnitId::EMPTY_SLOT`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub i32);

impl UnitId {
    /// Placeholder the shop reports for a slot with nothing in it.
    pub const EMPTY_SLOT: Self = Self(-1);

    /// Ids above this value belong to underlords rather than draftable heroes.
    pub const UNDERLORD_THRESHOLD: i32 = 1000;

    /// Buildable contraptions that occupy board slots but are not heroes.
    pub const CONTRAPTIONS: [Self; 3] = [Self(117), Self(143), Self(127)];

    /// Returns `true` if this id names a draftable hero (not an underlord,
    /// contraption or empty shop slot).
    #[must_use]
    pub fn is_hero(self) -> bool {
        self.0 >= 0 && self.0 <= Self::UNDERLORD_THRESHOLD && !Self::CONTRAPTIONS.contains(&self)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player account identifier, stable for a participant within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Synergy keyword identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeywordId(pub u32);

impl fmt::Display for KeywordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn match_id_display_is_raw_text() {
        let id = MatchId::new("28731604");
        assert_eq!(id.to_string(), "28731604");
        assert_eq!(id.as_str(), "28731604");
    }

    #[test]
    fn match_id_serializes_transparently() {
        let id = MatchId::from("abc");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"abc\"");
    }

    #[test]
    fn hero_classification() {
        assert!(UnitId(4).is_hero());
        assert!(!UnitId::EMPTY_SLOT.is_hero());
        assert!(!UnitId(1001).is_hero());
        assert!(!UnitId(117).is_hero());
        assert!(!UnitId(143).is_hero());
        assert!(!UnitId(127).is_hero());
    }

    #[test]
    fn ids_work_as_map_keys() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(AccountId(7), "bot");
        assert_eq!(map.get(&AccountId(7)), Some(&"bot"));
    }
}
