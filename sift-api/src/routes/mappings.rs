use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::instrument;

use crate::{app_state::AppState, routes::ApiError};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(mappings))
}

#[derive(Debug, Deserialize)]
struct MappingsQuery {
    /// Comma-separated index names; defaults to both indices.
    index: Option<String>,
    refresh: Option<bool>,
}

#[instrument(name = "GET /mappings", skip(app_state))]
async fn mappings(
    State(app_state): State<AppState>,
    Query(params): Query<MappingsQuery>,
) -> Result<Json<Value>, ApiError> {
    let indices: Vec<String> = match &params.index {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect(),
        None => app_state.indices().all(),
    };

    if params.refresh.unwrap_or(false) {
        app_state.mapping_cache().refresh(&app_state.store()).await;
    }

    // Diagnostic endpoint: a schema fetch failure degrades to an empty
    // mapping instead of a 5xx
    let index_refs: Vec<&str> = indices.iter().map(String::as_str).collect();
    let raw = match app_state.store().mappings(&index_refs).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!("mapping fetch failed: {err}");
            json!({})
        }
    };

    let summary = app_state.mapping_cache().snapshot().await.unwrap_or_default();

    Ok(Json(json!({
        "mappings": raw,
        "summary": summary,
    })))
}
