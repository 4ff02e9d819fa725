//! # match-companion
//!
//! Live match reconciliation and pool analytics for an 8-player auto-battler
//! companion dashboard.
//!
//! The service ingests periodic board snapshots and pushed change-event
//! batches for the match in progress, keeps a deduplicated and bounded
//! change history, and derives the shared hero pool, per-hero shop odds and
//! per-synergy pool depletion from the latest snapshot. When a match starts
//! it can pull the match's full history from the backend and fold it in with
//! whatever was pushed meanwhile.
//!
//! ## Architecture
//!
//! ```text
//! Ingest clients (HTTP)        Dashboards (HTTP, WebSocket)
//!     │                              │
//!     ├── REST Handlers (api/) ──────┤
//!     │                              ├── WS Handler (ws/)
//!     │                              │
//!     ├── CompanionService (service/)
//!     ├── EventBus (domain/) ────────┘
//!     │
//!     ├── MatchEngine (domain/)
//!     │     ├── MatchScope → ChangeLog
//!     │     └── pool → shop odds, synergy pool
//!     │
//!     └── HistorySource (source/) ── backend HTTP
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod service;
pub mod source;
pub mod ws;
