use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;

use crate::api::{ApiComputeRequest, ApiComputeResponse, ApiHistoryResponse};
use crate::history::SnapshotHistory;
use search_share::config::EngineConfig;
use search_share::{trend_for, RecommendationContext, RecommendationEngine, SnapshotAssembler};

#[derive(Clone)]
struct AppState {
    assembler: SnapshotAssembler,
    recommender: RecommendationEngine,
    history: Arc<SnapshotHistory>,
}

type ApiError = (StatusCode, String);

impl AppState {
    fn new(config: &EngineConfig, history: SnapshotHistory) -> Self {
        Self {
            assembler: config.assembler(),
            recommender: RecommendationEngine::new(),
            history: Arc::new(history),
        }
    }
}

pub async fn serve(args: crate::ServeArgs, config: EngineConfig) -> Result<(), String> {
    let history = SnapshotHistory::load(config.history.path.clone()).await?;
    let app = router(AppState::new(&config, history));

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|err| format!("invalid bind address: {}", err))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|err| format!("failed to bind server: {}", err))?;
    tracing::info!(%addr, history = %config.history.path.display(), "serving search-share api");

    axum::serve(listener, app)
        .await
        .map_err(|err| format!("server error: {}", err))?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/compute", post(compute_handler))
        .route(
            "/api/projects/:project_id/snapshots",
            post(create_snapshot_handler).get(list_snapshots_handler),
        )
        .route("/api/projects/:project_id/metrics", get(metrics_handler))
        .route(
            "/api/projects/:project_id",
            axum::routing::delete(delete_project_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

async fn compute_handler(
    State(state): State<AppState>,
    Json(request): Json<ApiComputeRequest>,
) -> Result<Json<ApiComputeResponse>, ApiError> {
    let input = request
        .into_input()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    let snapshot = state.assembler.assemble(&input, chrono::Utc::now());
    let recommendations = state
        .recommender
        .generate(&snapshot, &RecommendationContext::from_snapshot(&snapshot));

    Ok(Json(ApiComputeResponse {
        snapshot,
        trend: None,
        recommendations,
    }))
}

async fn create_snapshot_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<ApiComputeRequest>,
) -> Result<(StatusCode, Json<ApiComputeResponse>), ApiError> {
    let input = request
        .into_input()
        .map_err(|err| (StatusCode::BAD_REQUEST, err))?;
    let assembler = state.assembler;
    let (snapshot, trend) = state
        .history
        .append(&project_id, || assembler.assemble(&input, chrono::Utc::now()))
        .await
        .map_err(|err| {
            tracing::error!(%project_id, error = %err, "failed to append snapshot");
            (StatusCode::INTERNAL_SERVER_ERROR, err)
        })?;
    let recommendations = state
        .recommender
        .generate(&snapshot, &RecommendationContext::from_snapshot(&snapshot));

    Ok((
        StatusCode::CREATED,
        Json(ApiComputeResponse {
            snapshot,
            trend,
            recommendations,
        }),
    ))
}

async fn list_snapshots_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Json<ApiHistoryResponse> {
    let snapshots = state.history.history(&project_id).await;
    let trend = trend_for(&snapshots);
    Json(ApiHistoryResponse {
        project_id,
        snapshots,
        trend,
    })
}

async fn metrics_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<Json<ApiComputeResponse>, ApiError> {
    let mut snapshots = state.history.history(&project_id).await;
    let trend = trend_for(&snapshots);
    let snapshot = snapshots.pop().ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("no snapshots for project {}", project_id),
        )
    })?;
    let recommendations = state
        .recommender
        .generate(&snapshot, &RecommendationContext::from_snapshot(&snapshot));

    Ok(Json(ApiComputeResponse {
        snapshot,
        trend,
        recommendations,
    }))
}

async fn delete_project_handler(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let removed = state.history.delete_project(&project_id).await.map_err(|err| {
        tracing::error!(%project_id, error = %err, "failed to delete project history");
        (StatusCode::INTERNAL_SERVER_ERROR, err)
    })?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!("no snapshots for project {}", project_id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("search-share-server-{}-{}", name, std::process::id()))
            .join("snapshots.json")
    }

    async fn test_app(name: &str) -> (Router, PathBuf) {
        let path = temp_path(name);
        let _ = std::fs::remove_file(&path);
        let history = SnapshotHistory::load(path.clone()).await.unwrap();
        (router(AppState::new(&EngineConfig::default(), history)), path)
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn acme_input() -> Value {
        json!({
            "brand": { "name": "Acme", "volume": 2000 },
            "competitors": [{ "name": "Bolt", "volume": 8000 }],
            "marketKeywords": [{ "keyword": "trail shoes", "volume": 10000 }],
            "positions": { "0": { "Acme": 1 } }
        })
    }

    #[tokio::test]
    async fn metrics_for_unknown_project_is_not_found() {
        let (app, path) = test_app("metrics-404").await;

        let response = app
            .oneshot(request("GET", "/api/projects/nobody/metrics", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"no snapshots for project nobody");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn saved_snapshot_is_served_as_latest_metrics() {
        let (app, path) = test_app("metrics").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/projects/acme/snapshots",
                Some(acme_input()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(request("GET", "/api/projects/acme/metrics", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["snapshot"]["brandName"], "Acme");
        assert!((body["snapshot"]["sos"].as_f64().unwrap() - 20.0).abs() < 1e-9);
        assert!((body["snapshot"]["sov"].as_f64().unwrap() - 31.6).abs() < 1e-9);
        assert_eq!(body["recommendations"][0]["title"], "Growth signal");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn deleting_a_project_is_no_content_then_not_found() {
        let (app, path) = test_app("delete").await;

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/projects/acme/snapshots",
                Some(acme_input()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/projects/acme", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .clone()
            .oneshot(request("DELETE", "/api/projects/acme", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(request("GET", "/api/projects/acme/metrics", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn compute_rejects_duplicate_entity_names() {
        let (app, path) = test_app("duplicate").await;

        let response = app
            .oneshot(request(
                "POST",
                "/api/compute",
                Some(json!({
                    "brand": { "name": "Acme", "volume": 100 },
                    "competitors": [{ "name": "Acme", "volume": 100 }]
                })),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
