//! Read handlers: match status, change history, pool and synergies.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{
    ChangesParams, ChangesResponse, MatchStatusResponse, PoolResponse, SynergiesResponse,
    SynergyStatDto,
};
use crate::app_state::AppState;
use crate::error::{CompanionError, ErrorResponse};

/// `GET /match` — Active match overview.
#[utoipa::path(
    get,
    path = "/api/v1/match",
    tag = "Match",
    summary = "Active match status",
    responses(
        (status = 200, description = "Match status", body = MatchStatusResponse),
    )
)]
pub async fn get_match(State(state): State<AppState>) -> impl IntoResponse {
    Json(MatchStatusResponse::from(state.service.status().await))
}

/// `GET /changes` — Reconciled change history, newest first.
///
/// # Errors
///
/// Returns [`CompanionError::InvalidRequest`] on a malformed account filter.
#[utoipa::path(
    get,
    path = "/api/v1/changes",
    tag = "Match",
    summary = "Change history",
    description = "Returns the active match's deduplicated change history, newest first. Events without a usable timestamp come last.",
    params(ChangesParams),
    responses(
        (status = 200, description = "Change history", body = ChangesResponse),
        (status = 400, description = "Invalid filter", body = ErrorResponse),
    )
)]
pub async fn get_changes(
    State(state): State<AppState>,
    Query(params): Query<ChangesParams>,
) -> Result<impl IntoResponse, CompanionError> {
    let query = params.to_query()?;
    let (match_id, changes) = state
        .service
        .read(|engine| {
            (
                engine.current_match().map(ToString::to_string),
                engine.query_changes(&query),
            )
        })
        .await;
    Ok(Json(ChangesResponse {
        match_id,
        count: changes.len(),
        changes,
    }))
}

/// `GET /pool` — Remaining copies of every hero.
#[utoipa::path(
    get,
    path = "/api/v1/pool",
    tag = "Analytics",
    summary = "Shared pool counts",
    description = "Remaining and total copies of every hero in the reference table, derived from the latest snapshot.",
    responses(
        (status = 200, description = "Pool counts", body = PoolResponse),
    )
)]
pub async fn get_pool(State(state): State<AppState>) -> impl IntoResponse {
    let response = state
        .service
        .read(|engine| {
            PoolResponse::new(
                engine.current_match().map(ToString::to_string),
                engine.pool(),
                engine.reference(),
            )
        })
        .await;
    Json(response)
}

/// `GET /synergies` — Pool depletion per synergy.
#[utoipa::path(
    get,
    path = "/api/v1/synergies",
    tag = "Analytics",
    summary = "Synergy pool stats",
    description = "Pool totals aggregated by synergy keyword, largest remaining pool first.",
    responses(
        (status = 200, description = "Synergy stats", body = SynergiesResponse),
    )
)]
pub async fn get_synergies(State(state): State<AppState>) -> impl IntoResponse {
    let response = state
        .service
        .read(|engine| SynergiesResponse {
            match_id: engine.current_match().map(ToString::to_string),
            synergies: engine.synergies().iter().map(SynergyStatDto::from).collect(),
        })
        .await;
    Json(response)
}

/// Query routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/match", get(get_match))
        .route("/changes", get(get_changes))
        .route("/pool", get(get_pool))
        .route("/synergies", get(get_synergies))
}
