//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::EventBus;
use crate::service::CompanionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Companion service for all match logic.
    pub service: Arc<CompanionService>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Builds the state around a service, sharing its event bus.
    #[must_use]
    pub fn new(service: CompanionService) -> Self {
        let event_bus = service.event_bus().clone();
        Self {
            service: Arc::new(service),
            event_bus,
        }
    }
}
