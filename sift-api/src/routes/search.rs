use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::instrument;

use crate::{app_state::AppState, domain::search::SearchOutcome, routes::ApiError};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(search))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    #[serde(default)]
    query: String,
    user_email: Option<String>,
    limit: Option<usize>,
    #[serde(default)]
    debug: bool,
}

#[instrument(name = "POST /search", skip(app_state, body), fields(query = %body.query))]
async fn search(
    State(app_state): State<AppState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let outcome = app_state
        .search_service()
        .search(&body.query, body.user_email.as_deref(), body.limit, body.debug)
        .await?;

    Ok(Json(outcome))
}
