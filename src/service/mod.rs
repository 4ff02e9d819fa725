//! Service layer: business logic orchestration.
//!
//! [`CompanionService`] serialises access to the [`crate::domain::MatchEngine`],
//! runs catch-up fetches against the pull source, and emits events through
//! the [`crate::domain::EventBus`].

pub mod companion_service;

pub use companion_service::CompanionService;
