//! Static hero and synergy reference data.
//!
//! [`ReferenceTable`] is built once from the game's data export and shared
//! read-only as an `Arc<ReferenceTable>`. Until the data is available the
//! engine works with [`ReferenceTable::default`], the empty table, which
//! makes every pool and synergy computation yield empty output.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::{KeywordId, UnitId};
use crate::error::CompanionError;

/// Legacy keyword words whose synergy name is not simply the capitalised
/// word.
const IRREGULAR_KEYWORD_NAMES: [(&str, &str); 3] = [
    ("scaled", "Naga"),
    ("heartless", "Undead"),
    ("brute", "Brutal"),
];

/// Definition of one draftable hero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroDefinition {
    /// Hero type id.
    pub id: UnitId,
    /// Human-readable name.
    pub display_name: String,
    /// Draft tier (1 to 5).
    pub draft_tier: u8,
    /// Synergy keywords carried by this hero.
    pub keywords: Vec<KeywordId>,
}

/// Bidirectional keyword id ↔ synergy name lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynergyCatalog {
    names: BTreeMap<KeywordId, String>,
    ids: HashMap<String, KeywordId>,
}

impl SynergyCatalog {
    /// Builds a catalog from `(id, name)` pairs.
    #[must_use]
    pub fn new(entries: impl IntoIterator<Item = (KeywordId, String)>) -> Self {
        let mut catalog = Self::default();
        for (id, name) in entries {
            catalog.ids.insert(name.clone(), id);
            catalog.names.insert(id, name);
        }
        catalog
    }

    /// Synergy name for a keyword id.
    #[must_use]
    pub fn name(&self, keyword: KeywordId) -> Option<&str> {
        self.names.get(&keyword).map(String::as_str)
    }

    /// Keyword id for a canonical synergy name.
    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<KeywordId> {
        self.ids.get(name).copied()
    }

    /// Number of known synergies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if no synergies are known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Immutable lookup of hero definitions and synergy names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceTable {
    heroes: BTreeMap<UnitId, HeroDefinition>,
    synergies: SynergyCatalog,
}

impl ReferenceTable {
    /// Builds a table from hero definitions and a synergy catalog.
    #[must_use]
    pub fn new(heroes: impl IntoIterator<Item = HeroDefinition>, synergies: SynergyCatalog) -> Self {
        Self {
            heroes: heroes.into_iter().map(|h| (h.id, h)).collect(),
            synergies,
        }
    }

    /// Parses the heroes document and the keyword mapping document.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::ReferenceData`] if either document is not
    /// valid JSON of the expected shape.
    pub fn from_json(heroes_json: &str, mappings_json: &str) -> Result<Self, CompanionError> {
        let mappings: MappingsDocument = serde_json::from_str(mappings_json)
            .map_err(|e| CompanionError::ReferenceData(format!("keyword mappings: {e}")))?;
        let synergies = mappings.into_catalog();

        let document: HeroesDocument = serde_json::from_str(heroes_json)
            .map_err(|e| CompanionError::ReferenceData(format!("heroes: {e}")))?;

        let heroes: Vec<HeroDefinition> = document
            .heroes
            .into_iter()
            .map(|(name, raw)| {
                let keywords = match raw.keywords {
                    RawKeywords::Ids(ids) => ids.into_iter().map(KeywordId).collect(),
                    RawKeywords::Legacy(text) => parse_keyword_string(&text, &synergies),
                };
                HeroDefinition {
                    id: raw.id,
                    display_name: raw.display_name.unwrap_or(name),
                    draft_tier: raw.draft_tier,
                    keywords,
                }
            })
            .collect();

        Ok(Self::new(heroes, synergies))
    }

    /// Reads and parses both reference documents from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CompanionError::ReferenceData`] if a file cannot be read or
    /// parsed.
    pub fn load(heroes_path: &Path, mappings_path: &Path) -> Result<Self, CompanionError> {
        let heroes = std::fs::read_to_string(heroes_path).map_err(|e| {
            CompanionError::ReferenceData(format!("{}: {e}", heroes_path.display()))
        })?;
        let mappings = std::fs::read_to_string(mappings_path).map_err(|e| {
            CompanionError::ReferenceData(format!("{}: {e}", mappings_path.display()))
        })?;
        let table = Self::from_json(&heroes, &mappings)?;
        tracing::info!(
            heroes = table.heroes.len(),
            synergies = table.synergies.len(),
            "reference data loaded"
        );
        Ok(table)
    }

    /// Looks up a hero definition.
    #[must_use]
    pub fn hero(&self, unit_id: UnitId) -> Option<&HeroDefinition> {
        self.heroes.get(&unit_id)
    }

    /// Draft tier of a hero.
    #[must_use]
    pub fn tier_of(&self, unit_id: UnitId) -> Option<u8> {
        self.heroes.get(&unit_id).map(|h| h.draft_tier)
    }

    /// All hero definitions ordered by id.
    pub fn heroes(&self) -> impl Iterator<Item = &HeroDefinition> {
        self.heroes.values()
    }

    /// Synergy catalog.
    #[must_use]
    pub fn synergies(&self) -> &SynergyCatalog {
        &self.synergies
    }

    /// Number of hero definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heroes.len()
    }

    /// Returns `true` while no reference data is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heroes.is_empty()
    }
}

/// Canonical synergy name for one legacy keyword word.
#[must_use]
pub fn canonical_synergy_name(word: &str) -> String {
    let lower = word.to_lowercase();
    if let Some((_, name)) = IRREGULAR_KEYWORD_NAMES.iter().find(|(w, _)| *w == lower) {
        return (*name).to_string();
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parses a whitespace-delimited keyword string (`"brawny brute"`) into
/// keyword ids. Words with no matching synergy are skipped.
#[must_use]
pub fn parse_keyword_string(text: &str, catalog: &SynergyCatalog) -> Vec<KeywordId> {
    let mut seen = BTreeSet::new();
    let mut keywords = Vec::new();
    for word in text.split_whitespace() {
        let name = canonical_synergy_name(word);
        match catalog.keyword(&name) {
            Some(id) => {
                if seen.insert(id) {
                    keywords.push(id);
                }
            }
            None => tracing::warn!(word, synergy = %name, "no synergy for hero keyword"),
        }
    }
    keywords
}

#[derive(Debug, Deserialize)]
struct HeroesDocument {
    #[serde(default)]
    heroes: BTreeMap<String, RawHero>,
}

#[derive(Debug, Deserialize)]
struct RawHero {
    id: UnitId,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "draftTier")]
    draft_tier: u8,
    #[serde(default)]
    keywords: RawKeywords,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawKeywords {
    Ids(Vec<u32>),
    Legacy(String),
}

impl Default for RawKeywords {
    fn default() -> Self {
        Self::Ids(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
struct MappingsDocument {
    #[serde(default)]
    keyword_mappings: BTreeMap<String, String>,
    #[serde(default)]
    reverse_mappings: BTreeMap<String, u32>,
}

impl MappingsDocument {
    fn into_catalog(self) -> SynergyCatalog {
        let forward = self
            .keyword_mappings
            .into_iter()
            .filter_map(|(id, name)| id.parse().ok().map(|id| (KeywordId(id), name)));
        let reverse = self
            .reverse_mappings
            .into_iter()
            .map(|(name, id)| (KeywordId(id), name));
        SynergyCatalog::new(forward.chain(reverse))
    }
}
