//! Ingest handlers: snapshots, change batches, abandon and clear.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    AbandonRequest, ChangeBatchRequest, ChangesIngestedResponse, SnapshotRequest,
    TransitionResponse,
};
use crate::app_state::AppState;
use crate::domain::MatchSnapshot;
use crate::error::{CompanionError, ErrorResponse};

/// `POST /ingest/snapshot` — Apply a full match snapshot.
///
/// # Errors
///
/// Returns [`CompanionError::InvalidRank`] if a unit rank is outside 1 to 3.
#[utoipa::path(
    post,
    path = "/api/v1/ingest/snapshot",
    tag = "Ingest",
    summary = "Apply a match snapshot",
    description = "Replaces the latest board state. A snapshot for a new match flushes all state of the previous one; a snapshot without a match id ends the match. Pool and synergy stats are recomputed.",
    request_body = SnapshotRequest,
    responses(
        (status = 200, description = "Snapshot applied", body = TransitionResponse),
        (status = 400, description = "Invalid unit rank", body = ErrorResponse),
    )
)]
pub async fn ingest_snapshot(
    State(state): State<AppState>,
    Json(req): Json<SnapshotRequest>,
) -> Result<impl IntoResponse, CompanionError> {
    let snapshot = MatchSnapshot::try_from(req)?;
    let transition = state.service.ingest_snapshot(snapshot).await;
    Ok(Json(TransitionResponse::from(&transition)))
}

/// `POST /ingest/changes` — Merge a pushed change batch.
///
/// # Errors
///
/// Returns [`CompanionError::NoActiveMatch`] or
/// [`CompanionError::StaleMatch`] when the batch does not belong to the
/// active match.
#[utoipa::path(
    post,
    path = "/api/v1/ingest/changes",
    tag = "Ingest",
    summary = "Merge a change batch",
    description = "Deduplicates the batch against the active match's history and appends the new events. Batches for any other match are dropped.",
    request_body = ChangeBatchRequest,
    responses(
        (status = 200, description = "Batch merged", body = ChangesIngestedResponse),
        (status = 404, description = "No active match", body = ErrorResponse),
        (status = 409, description = "Batch belongs to another match", body = ErrorResponse),
    )
)]
pub async fn ingest_changes(
    State(state): State<AppState>,
    Json(req): Json<ChangeBatchRequest>,
) -> Result<impl IntoResponse, CompanionError> {
    let (match_id, summary) = state.service.ingest_changes(req.into()).await?;
    Ok(Json(ChangesIngestedResponse {
        match_id: match_id.to_string(),
        summary: summary.into(),
    }))
}

/// `POST /ingest/abandon` — Flush all state on match abandonment.
#[utoipa::path(
    post,
    path = "/api/v1/ingest/abandon",
    tag = "Ingest",
    summary = "Abandon the match",
    description = "Discards the snapshot, history and derived stats regardless of which match the signal names.",
    request_body = AbandonRequest,
    responses(
        (status = 200, description = "State flushed", body = TransitionResponse),
    )
)]
pub async fn ingest_abandon(
    State(state): State<AppState>,
    Json(req): Json<AbandonRequest>,
) -> impl IntoResponse {
    let transition = state.service.abandon(req.into()).await;
    Json(TransitionResponse::from(&transition))
}

/// `POST /ingest/clear` — Explicit clear request.
#[utoipa::path(
    post,
    path = "/api/v1/ingest/clear",
    tag = "Ingest",
    summary = "Clear all match state",
    responses(
        (status = 200, description = "State flushed", body = TransitionResponse),
    )
)]
pub async fn ingest_clear(State(state): State<AppState>) -> impl IntoResponse {
    let transition = state.service.clear().await;
    Json(TransitionResponse::from(&transition))
}

/// Ingest routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingest/snapshot", post(ingest_snapshot))
        .route("/ingest/changes", post(ingest_changes))
        .route("/ingest/abandon", post(ingest_abandon))
        .route("/ingest/clear", post(ingest_clear))
}
