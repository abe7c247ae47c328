use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Serialize;

use super::{ApiError, ApiResult};
use crate::{
    forecast::VoltagePrediction,
    kpi::{simulate, NetworkKpis, SimulationInput, SimulationPoint},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/voltage_frequency", get(voltage_frequency))
        .route("/kpis", get(kpis))
        .route("/simulate", post(simulate_network))
        .route("/predict", get(predict))
}

#[derive(Debug, Serialize)]
pub struct VoltageFrequencyPoint {
    pub timestamp: NaiveDateTime,
    pub mg_lv_voltage: f64,
    pub receiving_voltage: f64,
    pub mccb_voltage: f64,
    pub mg_lv_frequency: f64,
    pub mccb_frequency: f64,
}

pub async fn voltage_frequency(State(st): State<AppState>) -> ApiResult<Vec<VoltageFrequencyPoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| VoltageFrequencyPoint {
                timestamp: m.timestamp,
                mg_lv_voltage: m.mg_lv_voltage,
                receiving_voltage: m.receiving_voltage,
                mccb_voltage: m.mccb_voltage,
                mg_lv_frequency: m.mg_lv_frequency,
                mccb_frequency: m.mccb_frequency,
            })
            .collect(),
    ))
}

pub async fn kpis(State(st): State<AppState>) -> ApiResult<NetworkKpis> {
    Ok(Json(st.kpis.network(st.today()).await?))
}

pub async fn simulate_network(Json(input): Json<SimulationInput>) -> ApiResult<Vec<SimulationPoint>> {
    let values = [input.consumption, input.pv_production, input.fc_production];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ApiError::BadRequest("simulation inputs must be finite".to_string()));
    }
    Ok(Json(simulate(&input)))
}

pub async fn predict(State(st): State<AppState>) -> ApiResult<Vec<VoltagePrediction>> {
    Ok(Json(st.forecaster.predict().await?))
}
