//! Admin HTTP API.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use lingua_registry::{Placeholders, Resolver};
use lingua_sync::{SyncDirection, SyncEngine, SyncError, SyncSession, config::validate_namespace};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub resolver: Arc<Resolver>,
}

/// An error answered as `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let status = match err {
            SyncError::Validation(_) => StatusCode::BAD_REQUEST,
            SyncError::AlreadyInProgress(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub server_id: String,
    pub namespaces: Vec<String>,
    pub entries: usize,
    pub syncing: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    #[serde(default)]
    pub direction: SyncDirection,
    /// Answer with the finished session instead of 202.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ResolveResponse {
    pub language: String,
    pub namespace: String,
    pub key: String,
    pub text: String,
    pub found: bool,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ReloadResponse {
    pub namespace: String,
    pub entries: usize,
}

/// Builds the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/sync/{namespace}", post(start_sync))
        .route("/api/v1/sessions", get(list_sessions))
        .route("/api/v1/sessions/{namespace}", get(get_session))
        .route("/api/v1/resolve/{language}/{namespace}/{key}", get(resolve))
        .route("/api/v1/reload/{namespace}", post(reload))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let registry = state.engine.registry();
    let namespaces: Vec<String> = registry.namespaces().into_iter().collect();
    let syncing = namespaces
        .iter()
        .filter(|ns| state.engine.is_syncing(ns))
        .cloned()
        .collect();
    Json(HealthResponse {
        status: "ok".to_string(),
        server_id: state.engine.server_id().to_string(),
        entries: registry.len(),
        namespaces,
        syncing,
    })
}

async fn start_sync(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Query(params): Query<SyncParams>,
) -> Result<Response, ApiError> {
    validate_namespace(&namespace)?;
    if state.engine.is_syncing(&namespace) {
        return Err(SyncError::AlreadyInProgress(namespace).into());
    }

    if params.wait {
        let session = state.engine.sync(&namespace, params.direction).await;
        return Ok((StatusCode::OK, Json(session)).into_response());
    }

    info!("Sync of {} requested over HTTP", namespace);
    let engine = Arc::clone(&state.engine);
    let direction = params.direction;
    let name = namespace.clone();
    tokio::spawn(async move {
        let session = engine.sync(&name, direction).await;
        if !session.errors.is_empty() {
            warn!("Background sync of {} ended {:?}: {:?}", name, session.status, session.errors);
        }
    });
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "namespace": namespace, "status": "RUNNING" })),
    )
        .into_response())
}

async fn list_sessions(State(state): State<AppState>) -> Json<Vec<SyncSession>> {
    Json(state.engine.sessions())
}

async fn get_session(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<SyncSession>, ApiError> {
    state
        .engine
        .session(&namespace)
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, format!("no session for {namespace}")))
}

/// `?count=N` selects a plural form; every other parameter is a placeholder.
async fn resolve(
    State(state): State<AppState>,
    Path((language, namespace, key)): Path<(String, String, String)>,
    Query(mut params): Query<HashMap<String, String>>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let count = params
        .remove("count")
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, format!("invalid count {raw:?}")))
        })
        .transpose()?;
    let placeholders: Placeholders = params.into_iter().collect();

    let found = state.resolver.exists(&language, &namespace, &key);
    let text = match count {
        Some(count) => state
            .resolver
            .resolve_count(&language, &namespace, &key, count, &placeholders),
        None => state.resolver.resolve(&language, &namespace, &key, &placeholders),
    };
    Ok(Json(ResolveResponse {
        language,
        namespace,
        key,
        text,
        found,
    }))
}

async fn reload(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let entries = state.engine.reload_namespace(&namespace).await?;
    Ok(Json(ReloadResponse { namespace, entries }))
}
