use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    forecast_model: bool,
}

/// GET /healthz - liveness plus forecast model availability
pub async fn healthz(State(st): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        forecast_model: st.forecaster.is_available(),
    })
}

/// GET /metrics - Prometheus text exposition
pub async fn metrics(State(st): State<AppState>) -> String {
    st.metrics.as_ref().map(|h| h.render()).unwrap_or_default()
}
