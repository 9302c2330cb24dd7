//! HTTP server for post ranking and ingestion

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::engine::SharedRankingEngine;
use crate::error::{IngestError, RankError};
use crate::ingestion::Ingestion;
use crate::types::{NewPost, RankRequest, RankResponse, ViewerLocation};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: SharedRankingEngine,
    pub ingestion: Arc<Ingestion>,
}

/// Ranking request as received over HTTP (JSON body or query string)
#[derive(Debug, Default, Deserialize)]
pub struct ExploreRequestHttp {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub explain: Option<bool>,
    pub limit: Option<usize>,
}

impl ExploreRequestHttp {
    fn into_rank_request(self) -> Result<RankRequest, RankError> {
        let viewer = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(ViewerLocation { latitude, longitude }),
            (None, None) => None,
            _ => {
                return Err(RankError::InvalidRequest(
                    "latitude and longitude must be supplied together".to_string(),
                ))
            }
        };

        Ok(RankRequest {
            viewer,
            limit: self.limit,
            explain: self.explain.unwrap_or(false),
        })
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPostResponse {
    pub message: String,
    pub post_id: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: &str, details: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details: Some(details.to_string()),
        }),
    )
}

fn rank_error_response(e: RankError) -> ApiError {
    match e {
        RankError::DataUnavailable(_) => api_error(StatusCode::NOT_FOUND, "No posts available", e),
        RankError::InvalidRequest(_) => api_error(StatusCode::BAD_REQUEST, "Invalid request", e),
        RankError::Computation(_) | RankError::Store(_) => {
            error!("Ranking failed: {:?}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Ranking failed", e)
        }
    }
}

fn ingest_error_response(e: IngestError) -> ApiError {
    match e {
        IngestError::Validation(_) => {
            api_error(StatusCode::UNPROCESSABLE_ENTITY, "Invalid post", e)
        }
        IngestError::DuplicateId(_) => api_error(StatusCode::CONFLICT, "Duplicate post", e),
        IngestError::Store(_) => {
            error!("Ingestion failed: {:?}", e);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to add post", e)
        }
    }
}

/// Malformed bodies and query strings keep the axum status but use `ErrorResponse`
fn json_rejection_response(rejection: JsonRejection, error: &str) -> ApiError {
    warn!("Rejected request body: {}", rejection.body_text());
    api_error(rejection.status(), error, rejection.body_text())
}

fn query_rejection_response(rejection: QueryRejection) -> ApiError {
    warn!("Rejected query string: {}", rejection.body_text());
    api_error(rejection.status(), "Invalid request", rejection.body_text())
}

async fn explore(state: &AppState, req: ExploreRequestHttp) -> Result<Json<RankResponse>, ApiError> {
    let rank_req = req.into_rank_request().map_err(rank_error_response)?;
    let response = state.engine.rank(rank_req).await.map_err(rank_error_response)?;
    Ok(Json(response))
}

/// Ranking handler, JSON body
async fn explore_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<ExploreRequestHttp>, JsonRejection>,
) -> Result<Json<RankResponse>, ApiError> {
    let Json(req) = payload.map_err(|r| json_rejection_response(r, "Invalid request"))?;
    explore(&state, req).await
}

/// Ranking handler, query string
async fn explore_get_handler(
    State(state): State<AppState>,
    query: Result<Query<ExploreRequestHttp>, QueryRejection>,
) -> Result<Json<RankResponse>, ApiError> {
    let Query(req) = query.map_err(query_rejection_response)?;
    explore(&state, req).await
}

/// Ingestion handler
async fn add_post_handler(
    State(state): State<AppState>,
    payload: Result<Json<NewPost>, JsonRejection>,
) -> Result<Json<AddPostResponse>, ApiError> {
    let Json(post) = payload.map_err(|r| json_rejection_response(r, "Invalid post"))?;
    let record = state
        .ingestion
        .add_post(post)
        .await
        .map_err(ingest_error_response)?;

    Ok(Json(AddPostResponse {
        message: "Post added successfully!".to_string(),
        post_id: record.post_id,
    }))
}

/// Health check handler
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "foodrank".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create and configure the HTTP router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/explore", post(explore_post_handler).get(explore_get_handler))
        .route("/add_post", post(add_post_handler))
        .with_state(state)
}

/// Bind `host:port`, moving up one port at a time while the address is taken
pub async fn bind_with_fallback(host: &str, port: u16, attempts: u16) -> anyhow::Result<TcpListener> {
    let mut candidate = port;
    for attempt in 0..attempts.max(1) {
        let addr = format!("{}:{}", host, candidate);
        match TcpListener::bind(&addr).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && attempt + 1 < attempts => {
                warn!("Port {} is in use, trying {}", candidate, candidate.wrapping_add(1));
                candidate = candidate
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("no free port above {}", port))?;
            }
            Err(e) => return Err(anyhow::Error::new(e).context(format!("failed to bind {}", addr))),
        }
    }
    anyhow::bail!("no free port in {}..{}", port, port.saturating_add(attempts))
}

/// Run the HTTP server
pub async fn run_server(state: AppState, config: &ServiceConfig) -> anyhow::Result<()> {
    let listener = bind_with_fallback(&config.host, config.port, config.port_attempts).await?;
    let addr = listener.local_addr()?;
    info!("Starting foodrank server on {}", addr);

    let app = create_router(state);
    axum::serve(listener, app).await?;

    Ok(())
}
