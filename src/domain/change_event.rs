//! Discrete change events and their delivery-independent identity.
//!
//! A [`ChangeEvent`] records one mutation in a match (a unit bought, a
//! player levelled, a synergy lost). Events reach the client through two
//! independent paths and may arrive more than once, so each event derives a
//! [`ChangeKey`] from its content; two events with equal keys are the same
//! event regardless of how they were delivered.
//!
//! Parsing is deliberately tolerant: an event with missing or oddly typed
//! fields is still accepted and simply contributes empty components to its
//! key.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{AccountId, KeywordId, UnitId};

/// Kind of mutation a [`ChangeEvent`] describes.
///
/// Unrecognised tags are kept verbatim in [`ChangeKind::Other`] so that they
/// still take part in deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Unit bought from the shop.
    Bought,
    /// Unit sold back to the pool.
    Sold,
    /// Copies combined into a higher rank.
    Upgraded,
    /// Unit moved from the board to the bench.
    Benched,
    /// Unit moved from the bench to the board.
    Deployed,
    /// Unit moved within the board.
    Reposition,
    /// Unit moved within the bench.
    OrganizeBench,
    /// Shop rerolled.
    Reroll,
    /// Experience bought with gold.
    XpPurchase,
    /// Player level increased.
    LevelUp,
    /// Player took damage.
    HpChange,
    /// Item granted.
    ItemAdded,
    /// Item equipped on a unit.
    ItemAssigned,
    /// Item removed from a unit.
    ItemUnassigned,
    /// Item moved between units.
    ItemReassigned,
    /// Synergy became present.
    SynergyAdded,
    /// Synergy disappeared.
    SynergyRemoved,
    /// Synergy unit count changed.
    SynergyLevelChanged,
    /// Any tag outside the known set (empty when the tag was absent).
    Other(String),
}

impl ChangeKind {
    /// Returns the wire tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bought => "bought",
            Self::Sold => "sold",
            Self::Upgraded => "upgraded",
            Self::Benched => "benched",
            Self::Deployed => "deployed",
            Self::Reposition => "reposition",
            Self::OrganizeBench => "organize_bench",
            Self::Reroll => "reroll",
            Self::XpPurchase => "xp_purchase",
            Self::LevelUp => "level_up",
            Self::HpChange => "hp_change",
            Self::ItemAdded => "item_added",
            Self::ItemAssigned => "item_assigned",
            Self::ItemUnassigned => "item_unassigned",
            Self::ItemReassigned => "item_reassigned",
            Self::SynergyAdded => "synergy_added",
            Self::SynergyRemoved => "synergy_removed",
            Self::SynergyLevelChanged => "synergy_level_changed",
            Self::Other(tag) => tag,
        }
    }
}

impl Default for ChangeKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl FromStr for ChangeKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bought" => Self::Bought,
            "sold" => Self::Sold,
            "upgraded" => Self::Upgraded,
            "benched" => Self::Benched,
            "deployed" => Self::Deployed,
            "reposition" => Self::Reposition,
            "organize_bench" => Self::OrganizeBench,
            "reroll" => Self::Reroll,
            "xp_purchase" => Self::XpPurchase,
            "level_up" => Self::LevelUp,
            "hp_change" => Self::HpChange,
            "item_added" => Self::ItemAdded,
            "item_assigned" => Self::ItemAssigned,
            "item_unassigned" => Self::ItemUnassigned,
            "item_reassigned" => Self::ItemReassigned,
            "synergy_added" => Self::SynergyAdded,
            "synergy_removed" => Self::SynergyRemoved,
            "synergy_level_changed" => Self::SynergyLevelChanged,
            other => Self::Other(other.to_string()),
        })
    }
}

impl From<&str> for ChangeKind {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(kind) => kind,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ChangeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChangeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::String(tag)) => Self::from(tag.as_str()),
            Some(other) => Self::Other(other.to_string()),
            None => Self::default(),
        })
    }
}

/// Timestamp of an event exactly as the sender wrote it.
///
/// Numbers are epoch milliseconds; strings may hold a number or an ISO 8601
/// date. The raw form is kept because it is part of the event identity; the
/// parsed form is only used for ordering.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EventTime {
    /// No usable timestamp.
    #[default]
    Missing,
    /// Numeric timestamp.
    Number(serde_json::Number),
    /// Textual timestamp.
    Text(String),
}

impl EventTime {
    /// Creates a numeric timestamp from epoch milliseconds.
    #[must_use]
    pub fn millis(ms: i64) -> Self {
        Self::Number(ms.into())
    }

    /// Returns `true` if no timestamp was supplied.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Text used as the timestamp component of a [`ChangeKey`].
    ///
    /// Integral numbers are rendered without a fraction, so `100` and
    /// `100.0` name the same instant. Text is used verbatim.
    #[must_use]
    pub fn key_text(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Number(n) => number_key_text(n),
            Self::Text(s) => s.clone(),
        }
    }

    /// Epoch milliseconds, when the timestamp can be interpreted.
    #[must_use]
    pub fn sort_millis(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Number(n) => n.as_f64(),
            Self::Text(s) => parse_text_millis(s.trim()),
        }
    }

    /// Chronological order; uninterpretable timestamps sort after all others.
    #[must_use]
    pub fn chronological(&self, other: &Self) -> Ordering {
        match (self.sort_millis(), other.sort_millis()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

fn number_key_text(n: &serde_json::Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}

fn parse_text_millis(s: &str) -> Option<f64> {
    if let Ok(n) = s.parse::<f64>() {
        return n.is_finite().then_some(n);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    // Python's isoformat() without an offset.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc().timestamp_millis() as f64)
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing => serializer.serialize_none(),
            Self::Number(n) => n.serialize(serializer),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(serde_json::Value::Number(n)) => Self::Number(n),
            Some(serde_json::Value::String(s)) => Self::Text(s),
            _ => Self::Missing,
        })
    }
}

/// One discrete fact about a match mutation.
///
/// Only the identity fields are modelled; everything else the sender
/// included is kept in [`ChangeEvent::details`] for display.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Mutation kind.
    #[serde(rename = "type", default)]
    pub kind: ChangeKind,
    /// Player the mutation belongs to.
    #[serde(
        default,
        deserialize_with = "lenient_account",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_id: Option<AccountId>,
    /// When the mutation happened.
    #[serde(default, skip_serializing_if = "EventTime::is_missing")]
    pub timestamp: EventTime,
    /// Unit involved, for unit mutations.
    #[serde(
        default,
        deserialize_with = "lenient_unit",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_id: Option<UnitId>,
    /// Item involved, for item mutations.
    #[serde(
        default,
        deserialize_with = "lenient_item",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_id: Option<i64>,
    /// Synergy involved, for synergy mutations.
    #[serde(
        default,
        deserialize_with = "lenient_keyword",
        skip_serializing_if = "Option::is_none"
    )]
    pub synergy_keyword: Option<KeywordId>,
    /// Remaining sender-supplied fields, untouched.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl ChangeEvent {
    /// Creates an event with the identity fields common to every kind.
    #[must_use]
    pub fn new(kind: ChangeKind, account_id: AccountId, timestamp: EventTime) -> Self {
        Self {
            kind,
            account_id: Some(account_id),
            timestamp,
            ..Self::default()
        }
    }

    /// Sets the unit discriminator.
    #[must_use]
    pub fn with_unit(mut self, unit_id: UnitId) -> Self {
        self.unit_id = Some(unit_id);
        self
    }

    /// Sets the item discriminator.
    #[must_use]
    pub fn with_item(mut self, item_id: i64) -> Self {
        self.item_id = Some(item_id);
        self
    }

    /// Sets the synergy discriminator.
    #[must_use]
    pub fn with_synergy(mut self, keyword: KeywordId) -> Self {
        self.synergy_keyword = Some(keyword);
        self
    }

    /// Type-dependent discriminator: the first of unit, item or synergy that
    /// is present, or empty.
    #[must_use]
    pub fn discriminator(&self) -> String {
        if let Some(unit) = self.unit_id {
            unit.to_string()
        } else if let Some(item) = self.item_id {
            item.to_string()
        } else if let Some(keyword) = self.synergy_keyword {
            keyword.to_string()
        } else {
            String::new()
        }
    }

    /// Content-derived identity of this event.
    #[must_use]
    pub fn key(&self) -> ChangeKey {
        ChangeKey {
            timestamp: self.timestamp.key_text(),
            account_id: self.account_id,
            kind: self.kind.as_str().to_string(),
            discriminator: self.discriminator(),
        }
    }
}

/// Identity tuple `(timestamp, account, kind, discriminator)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeKey {
    timestamp: String,
    account_id: Option<AccountId>,
    kind: String,
    discriminator: String,
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let account = self.account_id.map(|a| a.to_string()).unwrap_or_default();
        write!(
            f,
            "{}-{}-{}-{}",
            self.timestamp, account, self.kind, self.discriminator
        )
    }
}

/// Keeps the first occurrence of every [`ChangeKey`], preserving input order.
///
/// The seen-set lives only for the duration of the call.
#[must_use]
pub fn dedup(events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|event| seen.insert(event.key()))
        .collect()
}

fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_account<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<AccountId>, D::Error> {
    Ok(lenient_integer(deserializer)?
        .and_then(|n| u64::try_from(n).ok())
        .map(AccountId))
}

fn lenient_unit<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<UnitId>, D::Error> {
    Ok(lenient_integer(deserializer)?
        .and_then(|n| i32::try_from(n).ok())
        .map(UnitId))
}

fn lenient_item<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    lenient_integer(deserializer)
}

fn lenient_keyword<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<KeywordId>, D::Error> {
    Ok(lenient_integer(deserializer)?
        .and_then(|n| u32::try_from(n).ok())
        .map(KeywordId))
}
