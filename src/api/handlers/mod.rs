//! REST endpoint handlers organized by resource.

pub mod ingest;
pub mod odds;
pub mod query;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(ingest::routes())
        .merge(query::routes())
        .merge(odds::routes())
}
