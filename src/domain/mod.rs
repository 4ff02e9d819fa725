//! Domain layer: match model, reconciliation engine and pool analytics.
//!
//! Everything here is synchronous and free of I/O. [`MatchEngine`] owns the
//! match-scoped state; the pool, shop and synergy modules are pure
//! functions over a snapshot and the [`ReferenceTable`]. [`EventBus`]
//! carries [`EngineEvent`]s to subscribers.

pub mod change_event;
pub mod change_log;
pub mod engine;
pub mod engine_event;
pub mod event_bus;
pub mod ids;
pub mod match_scope;
pub mod messages;
pub mod pool;
pub mod reference;
pub mod shop_odds;
pub mod snapshot;
pub mod synergy_pool;

pub use change_event::{ChangeEvent, ChangeKey, ChangeKind, EventTime};
pub use change_log::{ChangeLog, ChangeQuery, DEFAULT_HISTORY_CAPACITY, Reconciled};
pub use engine::{BatchOutcome, CatchUpOutcome, CatchUpTicket, MatchEngine, MatchStatus};
pub use engine_event::{DiscardReason, EngineEvent};
pub use event_bus::EventBus;
pub use ids::{AccountId, KeywordId, MatchId, UnitId};
pub use match_scope::{FlushReason, MatchScope, ScopeTransition};
pub use messages::{AbandonSignal, ChangeBatch, HistoryRequest, HistoryResponse};
pub use pool::{PoolCount, PoolCounts, calculate_pool_counts, consumed_units, pool_size_for_tier};
pub use reference::{HeroDefinition, ReferenceTable, SynergyCatalog};
pub use shop_odds::{HeroOdds, LevelOdds, odds_by_level, shop_odds, shop_probability, tier_odds};
pub use snapshot::{MatchSnapshot, PlayerBoard, Position, Rank, RankOutOfRange, Unit};
pub use synergy_pool::{SynergyPoolStat, calculate_synergy_pool_stats};
