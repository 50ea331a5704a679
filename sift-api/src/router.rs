use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::{app_state::AppState, config::Settings, domain::store::DocumentStore, routes};

pub fn create(store: Arc<dyn DocumentStore>, config: Settings) -> Router<()> {
    let app = Router::new()
        .route("/", get(|| async { "sift-api is alive" }))
        .nest("/index", routes::index::router())
        .nest("/search", routes::search::router())
        .nest("/mappings", routes::mappings::router());

    let app_state = AppState::new(store, &config);

    let app_url = config.application.app_url.clone();
    let allowed_suffix = config.application.cors_allowed_origin_suffix.clone();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            "content-type".parse().unwrap(),
            "x-doc-type".parse().unwrap(),
            "x-webhook-secret".parse().unwrap(),
        ])
        .allow_origin(AllowOrigin::predicate(move |origin, _| {
            let origin_str = origin.to_str().unwrap_or_default();
            if origin_str == app_url {
                return true;
            }
            if let Some(ref suffix) = allowed_suffix {
                return origin_str.starts_with("https://") && origin_str.ends_with(suffix.as_str());
            }
            false
        }));

    app.with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
}
