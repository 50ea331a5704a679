use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::ingest::{classify, EventKind, ReconcileAction},
    routes::{error::ErrorCode, ApiError},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/task", post(index_task))
        .route("/organization", post(index_organization))
}

#[derive(Serialize)]
struct IndexResponse {
    ok: bool,
    action: ReconcileAction,
    id: String,
    index: String,
}

#[instrument(name = "POST /index/task", skip(app_state, headers, body))]
async fn index_task(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<IndexResponse>, ApiError> {
    handle_index_event(app_state, headers, body).await
}

#[instrument(name = "POST /index/organization", skip(app_state, headers, body))]
async fn index_organization(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<IndexResponse>, ApiError> {
    handle_index_event(app_state, headers, body).await
}

/// Shared ingestion path: classification decides what the payload is,
/// not which endpoint it arrived on.
async fn handle_index_event(
    app_state: AppState,
    headers: HeaderMap,
    body: Value,
) -> Result<Json<IndexResponse>, ApiError> {
    check_webhook_secret(&app_state, &headers)?;

    let event = EventKind::from_descriptor(
        body.get("event")
            .or_else(|| body.get("eventType"))
            .and_then(Value::as_str),
    );
    let hint = headers
        .get("x-doc-type")
        .and_then(|value| value.to_str().ok())
        .or_else(|| body.get("docType").and_then(Value::as_str));

    // The payload may be wrapped in an envelope or be the body itself
    let payload = body
        .get("payload")
        .or_else(|| body.get("document"))
        .or_else(|| body.get("data"))
        .unwrap_or(&body);

    let kind = classify(payload, hint);
    tracing::debug!(kind = %kind, event = ?event, "classified index event");

    let outcome = app_state.reconciler().apply(event, kind, payload).await?;

    Ok(Json(IndexResponse {
        ok: true,
        action: outcome.action,
        id: outcome.id,
        index: outcome.index,
    }))
}

fn check_webhook_secret(app_state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = app_state.webhook_secret() else {
        return Ok(());
    };

    let presented = headers
        .get("x-webhook-secret")
        .and_then(|value| value.to_str().ok());

    if presented == Some(expected) {
        Ok(())
    } else {
        Err(ApiError::unauthorized(ErrorCode::InvalidWebhookSecret))
    }
}
