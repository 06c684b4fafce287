//! Route handlers and router assembly.

use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::service::{dataset_id, DatasetService};
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{
    ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED, RANGE,
};
use axum::http::{HeaderMap, Response, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use forgehub_client::{SharedForgeClient, TreeEntry};
use forgehub_core::{HubError, MetadataView};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    service: DatasetService,
    forge: SharedForgeClient,
}

impl AppState {
    /// Build the state from explicitly constructed components.
    pub fn new(forge: SharedForgeClient, service: DatasetService) -> Self {
        Self { service, forge }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/datasets", get(list_datasets))
        .route("/datasets/:owner/:dataset", get(dataset_detail))
        .route("/datasets/:owner/:dataset/info", get(dataset_info))
        .route("/datasets/:owner/:dataset/tree/:revision", get(dataset_tree))
        .route(
            "/datasets/:owner/:dataset/resolve/:revision/*path",
            get(resolve_file),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Revision query parameter, defaulting to `main`.
#[derive(Debug, Deserialize)]
struct RevisionQuery {
    revision: Option<String>,
}

/// Tree endpoint response
#[derive(Debug, Serialize)]
struct TreeView {
    id: String,
    revision: String,
    tree: Vec<TreeEntry>,
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// List all cached dataset records.
async fn list_datasets(State(state): State<AppState>) -> Result<Json<Vec<MetadataView>>, ApiError> {
    Ok(Json(state.service.list_cached().await?))
}

/// Dataset detail: cached record first, live refresh at `main` as a
/// fallback; 404 when neither is available.
async fn dataset_detail(
    State(state): State<AppState>,
    Path((owner, dataset)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<MetadataView>, ApiError> {
    let token = bearer_token(&headers)?;

    if let Some(cached) = state.service.get_cached(&owner, &dataset).await? {
        return Ok(Json(cached));
    }

    state
        .service
        .refresh(&owner, &dataset, "main", token.as_deref())
        .await
        .map(Json)
        .map_err(|_| ApiError::NotFound(dataset_id(&owner, &dataset)))
}

/// Refresh-first metadata lookup with stale-cache fallback.
///
/// A failed refresh is answered from the cache when a record exists; the
/// upstream error surfaces only when there is nothing to fall back to.
async fn dataset_info(
    State(state): State<AppState>,
    Path((owner, dataset)): Path<(String, String)>,
    Query(query): Query<RevisionQuery>,
    headers: HeaderMap,
) -> Result<Json<MetadataView>, ApiError> {
    let token = bearer_token(&headers)?;
    let revision = query.revision.as_deref().unwrap_or("main");

    match state
        .service
        .refresh(&owner, &dataset, revision, token.as_deref())
        .await
    {
        Ok(view) => Ok(Json(view)),
        Err(e) if e.is_upstream() => {
            if let Some(cached) = state.service.get_cached(&owner, &dataset).await? {
                tracing::warn!(
                    id = %dataset_id(&owner, &dataset),
                    error = %e,
                    "refresh failed, serving stale cache"
                );
                return Ok(Json(cached));
            }
            Err(e)
        }
        Err(e) => Err(e),
    }
}

/// Live tree listing straight from the forge; no cache involvement.
async fn dataset_tree(
    State(state): State<AppState>,
    Path((owner, dataset, revision)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<TreeView>, ApiError> {
    let token = bearer_token(&headers)?;
    let tree = state
        .forge
        .get_tree(&owner, &dataset, &revision, token.as_deref())
        .await?;

    Ok(Json(TreeView {
        id: dataset_id(&owner, &dataset),
        revision,
        tree: tree.tree,
    }))
}

/// Streaming proxy path: resolve a file's bytes from the forge and relay
/// them without buffering.
async fn resolve_file(
    State(state): State<AppState>,
    Path((owner, dataset, revision, path)): Path<(String, String, String, String)>,
    headers: HeaderMap,
) -> Result<Response<Body>, ApiError> {
    let token = bearer_token(&headers)?;
    let range = headers
        .get(RANGE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let upstream = state
        .forge
        .stream_file(
            &owner,
            &dataset,
            &path,
            &revision,
            token.as_deref(),
            range.as_deref(),
        )
        .await?;

    // No body bytes are relayed on an upstream 401; the connection is
    // released before the error response is built.
    if upstream.status() == StatusCode::UNAUTHORIZED {
        upstream.close();
        return Err(ApiError::Unauthorized);
    }

    let mut response = Response::builder().status(upstream.status());
    for name in [
        CONTENT_LENGTH,
        CONTENT_TYPE,
        CONTENT_RANGE,
        ACCEPT_RANGES,
        LAST_MODIFIED,
        ETAG,
    ] {
        if let Some(value) = upstream.headers().get(&name) {
            response = response.header(name, value.clone());
        }
    }
    if !upstream.headers().contains_key(CONTENT_TYPE) {
        response = response.header(CONTENT_TYPE, "application/octet-stream");
    }

    response
        .body(Body::from_stream(upstream.into_body()))
        .map_err(|e| ApiError::Internal(HubError::Other(e.to_string())))
}
