//! Shop odds and catch-up handlers.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CatchUpResponse, HeroOddsDto, LevelOddsDto, OddsParams, OddsResponse, ShopOddsRequest,
    ShopOddsResponse,
};
use crate::app_state::AppState;
use crate::domain::{AccountId, UnitId};
use crate::domain::shop_odds::MAX_LEVEL;
use crate::error::{CompanionError, ErrorResponse};

/// Player levels outside 1 to [`MAX_LEVEL`] are read as the nearest bound.
fn clamp_level(level: u32) -> u32 {
    level.clamp(1, MAX_LEVEL)
}

/// `GET /odds/{unit_id}` — Reroll odds of one hero.
///
/// # Errors
///
/// Returns [`CompanionError::UnknownUnit`] if the hero is not in the
/// reference table.
#[utoipa::path(
    get,
    path = "/api/v1/odds/{unit_id}",
    tag = "Analytics",
    summary = "Hero shop odds",
    description = "Chance that the hero appears at least once in a five-slot reroll, at every player level, given the current pool. A level outside 1 to 10 is clamped.",
    params(
        ("unit_id" = i32, Path, description = "Hero type id"),
        OddsParams,
    ),
    responses(
        (status = 200, description = "Odds by level", body = OddsResponse),
        (status = 404, description = "Unknown hero", body = ErrorResponse),
    )
)]
pub async fn get_odds(
    State(state): State<AppState>,
    Path(unit_id): Path<i32>,
    Query(params): Query<OddsParams>,
) -> Result<impl IntoResponse, CompanionError> {
    let level = params.level.map(clamp_level);
    let by_level = state.service.odds(UnitId(unit_id)).await?;
    let probability =
        level.and_then(|l| by_level.iter().find(|o| o.level == l).map(|o| o.probability));
    Ok(Json(OddsResponse {
        unit_id,
        level,
        probability,
        by_level: by_level.iter().map(LevelOddsDto::from).collect(),
    }))
}

/// `POST /shop-odds` — Reroll odds of every hero a player owns.
///
/// # Errors
///
/// Returns [`CompanionError::NoActiveMatch`] without a snapshot and
/// [`CompanionError::UnknownPlayer`] if the player has no board.
#[utoipa::path(
    post,
    path = "/api/v1/shop-odds",
    tag = "Analytics",
    summary = "Owned hero shop odds",
    description = "For each hero the player owns below rank 3, the chance to see it in the next reroll. The current offer is taken out of the pool first; heroes already offered report zero. A level outside 1 to 10 is clamped.",
    request_body = ShopOddsRequest,
    responses(
        (status = 200, description = "Odds per owned hero", body = ShopOddsResponse),
        (status = 404, description = "No active match or unknown player", body = ErrorResponse),
    )
)]
pub async fn post_shop_odds(
    State(state): State<AppState>,
    Json(req): Json<ShopOddsRequest>,
) -> Result<impl IntoResponse, CompanionError> {
    let level = clamp_level(req.level);
    let shop: Vec<UnitId> = req.shop_units.iter().copied().map(UnitId).collect();
    let heroes = state
        .service
        .shop_odds(AccountId(req.account_id), &shop, level)
        .await?;
    Ok(Json(ShopOddsResponse {
        account_id: req.account_id,
        level,
        heroes: heroes.iter().map(HeroOddsDto::from).collect(),
    }))
}

/// `POST /catch-up` — Fetch and fold in the active match's history.
///
/// # Errors
///
/// Returns [`CompanionError::NoActiveMatch`] if no match is active and
/// [`CompanionError::HistoryFetch`] if the backend cannot be reached.
#[utoipa::path(
    post,
    path = "/api/v1/catch-up",
    tag = "Match",
    summary = "Catch up on history",
    description = "Pulls the active match's full change history from the backend and merges it with what was pushed meanwhile. A response that outlives its match is reported as stale.",
    responses(
        (status = 200, description = "Catch-up outcome", body = CatchUpResponse),
        (status = 404, description = "No active match", body = ErrorResponse),
        (status = 502, description = "Backend unavailable", body = ErrorResponse),
    )
)]
pub async fn post_catch_up(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, CompanionError> {
    let outcome = state.service.catch_up().await?;
    Ok(Json(CatchUpResponse::from(outcome)))
}

/// Odds and catch-up routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/odds/{unit_id}", get(get_odds))
        .route("/shop-odds", post(post_shop_odds))
        .route("/catch-up", post(post_catch_up))
}
