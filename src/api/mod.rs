pub mod consumers;
pub mod distribution;
pub mod error;
pub mod health;
pub mod network_quality;
pub mod production;
pub mod storage;

use std::time::Duration;

use axum::{
    http::{header, Method},
    routing::get,
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use error::ApiError;

use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, ApiError>;

pub fn router(state: AppState) -> Router {
    let cfg = state.cfg.clone();

    let mut router = Router::new()
        .nest("/production", production::routes())
        .nest("/distribution", distribution::routes())
        .nest("/storage", storage::routes())
        .nest("/network_quality", network_quality::routes())
        .nest("/consumers", consumers::routes())
        .route("/healthz", get(health::healthz));

    if cfg.server.enable_metrics && state.metrics.is_some() {
        router = router.route("/metrics", get(health::metrics));
    }

    let mut router = router.with_state(state);

    if cfg.server.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any)
            .expose_headers([header::CONTENT_DISPOSITION]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(cfg.server.request_timeout_secs))),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
