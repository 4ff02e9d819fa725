//! REST API layer: route handlers, DTOs, and router composition.
//!
//! All endpoints are mounted under `/api/v1`. With the `swagger-ui` feature
//! the OpenAPI document is served at `/api-docs/openapi.json` and browsable
//! at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document of the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "match-companion", description = "Live match reconciliation and pool analytics"),
    paths(
        handlers::system::health_handler,
        handlers::ingest::ingest_snapshot,
        handlers::ingest::ingest_changes,
        handlers::ingest::ingest_abandon,
        handlers::ingest::ingest_clear,
        handlers::query::get_match,
        handlers::query::get_changes,
        handlers::query::get_pool,
        handlers::query::get_synergies,
        handlers::odds::get_odds,
        handlers::odds::post_shop_odds,
        handlers::odds::post_catch_up,
    ),
    tags(
        (name = "Ingest", description = "Snapshots, change batches and match lifecycle"),
        (name = "Match", description = "Active match state and history"),
        (name = "Analytics", description = "Pool, synergy and shop odds"),
        (name = "System", description = "Service health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{
        EventBus, HeroDefinition, HistoryRequest, HistoryResponse, KeywordId, MatchEngine,
        ReferenceTable, SynergyCatalog, UnitId,
    };
    use crate::error::CompanionError;
    use crate::service::CompanionService;
    use crate::source::HistorySource;

    #[derive(Debug)]
    struct EmptySource;

    #[async_trait]
    impl HistorySource for EmptySource {
        async fn fetch(&self, request: &HistoryRequest) -> Result<HistoryResponse, CompanionError> {
            Ok(HistoryResponse {
                status: "success".to_string(),
                match_id: Some(request.match_id.clone()),
                changes: Vec::new(),
                count: 0,
            })
        }
    }

    fn app() -> Router {
        let heroes = vec![
            HeroDefinition {
                id: UnitId(1),
                display_name: "Axe".to_string(),
                draft_tier: 1,
                keywords: vec![KeywordId(1)],
            },
            HeroDefinition {
                id: UnitId(2),
                display_name: "Lina".to_string(),
                draft_tier: 3,
                keywords: vec![KeywordId(1)],
            },
        ];
        let synergies = SynergyCatalog::new([(KeywordId(1), "Brawny".to_string())]);
        let reference = Arc::new(ReferenceTable::new(heroes, synergies));
        let service = CompanionService::new(
            MatchEngine::new(reference, 500),
            EventBus::new(64),
            Arc::new(EmptySource),
            false,
        );
        build_router().with_state(AppState::new(service))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        };
        let Ok(request) = request else {
            panic!("request should build");
        };
        let Ok(response) = app.clone().oneshot(request).await;
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn snapshot_body(match_id: &str, rank: u8) -> Value {
        json!({
            "match_id": match_id,
            "players": [{"account_id": 7, "units": [{"unit_id": 1, "rank": rank}, {"unit_id": -1}]}],
            "timestamp": 1000
        })
    }

    fn error_code(body: &Value) -> Option<u64> {
        body.get("error").and_then(|e| e.get("code")).and_then(Value::as_u64)
    }

    #[tokio::test]
    async fn health_reports_no_match() {
        let app = app();
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("active_match"), Some(&Value::Bool(false)));
    }

    #[tokio::test]
    async fn snapshot_updates_pool() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/v1/ingest/snapshot", Some(snapshot_body("m1", 2))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("transition"), Some(&json!("started")));

        let (status, body) = send(&app, "GET", "/api/v1/pool", None).await;
        assert_eq!(status, StatusCode::OK);
        let axe = body
            .get("units")
            .and_then(Value::as_array)
            .and_then(|units| units.iter().find(|u| u.get("unit_id") == Some(&json!(1))));
        let Some(axe) = axe else {
            panic!("pool should list hero 1");
        };
        assert_eq!(axe.get("used"), Some(&json!(3)));
        assert_eq!(axe.get("name"), Some(&json!("Axe")));
    }

    #[tokio::test]
    async fn invalid_rank_is_bad_request() {
        let app = app();
        let (status, body) = send(&app, "POST", "/api/v1/ingest/snapshot", Some(snapshot_body("m1", 4))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_code(&body), Some(1002));
    }

    #[tokio::test]
    async fn changes_need_an_active_match() {
        let app = app();
        let batch = json!({"match_id": "m1", "changes": [{"type": "bought", "account_id": 7, "timestamp": 5, "unit_id": 1}]});
        let (status, body) = send(&app, "POST", "/api/v1/ingest/changes", Some(batch)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), Some(2001));
    }

    #[tokio::test]
    async fn changes_merge_and_stale_batches_conflict() {
        let app = app();
        send(&app, "POST", "/api/v1/ingest/snapshot", Some(snapshot_body("m1", 1))).await;

        let event = json!({"type": "bought", "account_id": 7, "timestamp": 5, "unit_id": 1});
        let batch = json!({"match_id": "m1", "changes": [event.clone(), event]});
        let (status, body) = send(&app, "POST", "/api/v1/ingest/changes", Some(batch)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("summary").and_then(|s| s.get("retained")), Some(&json!(1)));

        let stale = json!({"match_id": "m0", "changes": []});
        let (status, body) = send(&app, "POST", "/api/v1/ingest/changes", Some(stale)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error_code(&body), Some(2003));

        let (status, body) = send(&app, "GET", "/api/v1/changes?account_id=7&kind=bought", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("count"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn abandon_clears_history() {
        let app = app();
        send(&app, "POST", "/api/v1/ingest/snapshot", Some(snapshot_body("m1", 1))).await;
        let (status, body) = send(&app, "POST", "/api/v1/ingest/abandon", Some(json!({"match_id": "m1", "reason": "left"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("transition"), Some(&json!("flushed")));

        let (_, body) = send(&app, "GET", "/api/v1/match", None).await;
        assert_eq!(body.get("match_id"), Some(&Value::Null));
        assert_eq!(body.get("change_count"), Some(&json!(0)));
    }

    #[tokio::test]
    async fn odds_reject_unknown_hero_and_clamp_level() {
        let app = app();
        let (status, _) = send(&app, "GET", "/api/v1/odds/99", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, above) = send(&app, "GET", "/api/v1/odds/1?level=11", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(above.get("level"), Some(&json!(10)));
        let (_, top) = send(&app, "GET", "/api/v1/odds/1?level=10", None).await;
        assert_eq!(above.get("probability"), top.get("probability"));
        assert!(above.get("probability").is_some_and(Value::is_f64));

        let (status, below) = send(&app, "GET", "/api/v1/odds/1?level=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(below.get("level"), Some(&json!(1)));

        let (status, body) = send(&app, "GET", "/api/v1/odds/1?level=1", None).await;
        assert_eq!(status, StatusCode::OK);
        let by_level = body.get("by_level").and_then(Value::as_array).map(Vec::len);
        assert_eq!(by_level, Some(10));
        assert!(body.get("probability").and_then(Value::as_f64).is_some_and(|p| p > 0.0));
    }

    #[tokio::test]
    async fn shop_odds_for_owned_heroes() {
        let app = app();
        let (status, _) = send(&app, "POST", "/api/v1/shop-odds", Some(json!({"account_id": 7, "level": 3}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, "POST", "/api/v1/ingest/snapshot", Some(snapshot_body("m1", 1))).await;
        let (status, body) = send(&app, "POST", "/api/v1/shop-odds", Some(json!({"account_id": 8, "level": 3}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_code(&body), Some(2004));

        let (status, body) = send(&app, "POST", "/api/v1/shop-odds", Some(json!({"account_id": 7, "level": 42}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("level"), Some(&json!(10)));

        let request = json!({"account_id": 7, "shop_units": [1, -1], "level": 3});
        let (status, body) = send(&app, "POST", "/api/v1/shop-odds", Some(request)).await;
        assert_eq!(status, StatusCode::OK);
        let Some(first) = body.get("heroes").and_then(Value::as_array).and_then(|h| h.first()) else {
            panic!("owned hero should be listed");
        };
        assert_eq!(first.get("in_shop"), Some(&json!(true)));
        assert_eq!(first.get("probability"), Some(&json!(0.0)));
    }

    #[tokio::test]
    async fn catch_up_applies_empty_history() {
        let app = app();
        let (status, _) = send(&app, "POST", "/api/v1/catch-up", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, "POST", "/api/v1/ingest/snapshot", Some(snapshot_body("m1", 1))).await;
        let (status, body) = send(&app, "POST", "/api/v1/catch-up", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.get("status"), Some(&json!("applied")));
    }

    #[test]
    fn openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/ingest/snapshot"));
        assert!(doc.paths.paths.contains_key("/api/v1/odds/{unit_id}"));
    }
}
