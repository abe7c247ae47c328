//! Production views: battery, photovoltaic and fuel cell output.

use axum::{extract::State, routing::get, Json, Router};
use chrono::NaiveDateTime;
use serde::Serialize;

use super::ApiResult;
use crate::{kpi::ProductionKpis, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/battery_power", get(battery_power))
        .route("/battery_set_response", get(battery_set_response))
        .route("/pv_power", get(pv_power))
        .route("/fuel_cell", get(fuel_cell))
        .route("/kpi/renewable_percentage", get(renewable_percentage))
        .route("/kpi/battery_efficiency", get(battery_efficiency))
        .route("/kpi/fuel_cell_reliability", get(fuel_cell_reliability))
        .route("/kpis", get(kpis))
}

#[derive(Debug, Serialize)]
pub struct BatteryPowerPoint {
    pub timestamp: NaiveDateTime,
    pub battery_power: f64,
}

#[derive(Debug, Serialize)]
pub struct BatterySetResponsePoint {
    pub timestamp: NaiveDateTime,
    pub battery_power: f64,
    pub battery_set_response: f64,
}

#[derive(Debug, Serialize)]
pub struct PvPowerPoint {
    pub timestamp: NaiveDateTime,
    pub pv_power: f64,
}

#[derive(Debug, Serialize)]
pub struct FuelCellPoint {
    pub timestamp: NaiveDateTime,
    pub fc_power: f64,
    pub fc_setpoint: f64,
    pub fc_set_response: f64,
}

pub async fn battery_power(State(st): State<AppState>) -> ApiResult<Vec<BatteryPowerPoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| BatteryPowerPoint {
                timestamp: m.timestamp,
                battery_power: m.battery_power,
            })
            .collect(),
    ))
}

pub async fn battery_set_response(
    State(st): State<AppState>,
) -> ApiResult<Vec<BatterySetResponsePoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| BatterySetResponsePoint {
                timestamp: m.timestamp,
                battery_power: m.battery_power,
                battery_set_response: m.battery_set_response,
            })
            .collect(),
    ))
}

pub async fn pv_power(State(st): State<AppState>) -> ApiResult<Vec<PvPowerPoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| PvPowerPoint {
                timestamp: m.timestamp,
                pv_power: m.pv_power,
            })
            .collect(),
    ))
}

pub async fn fuel_cell(State(st): State<AppState>) -> ApiResult<Vec<FuelCellPoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| FuelCellPoint {
                timestamp: m.timestamp,
                fc_power: m.fc_power,
                fc_setpoint: m.fc_setpoint,
                fc_set_response: m.fc_set_response,
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct RenewablePercentage {
    pub renewable_percentage: f64,
}

#[derive(Debug, Serialize)]
pub struct BatteryEfficiency {
    pub battery_efficiency: f64,
}

#[derive(Debug, Serialize)]
pub struct FuelCellReliability {
    pub fuel_cell_reliability: f64,
}

pub async fn renewable_percentage(State(st): State<AppState>) -> ApiResult<RenewablePercentage> {
    let k = st.kpis.production(st.today()).await?;
    Ok(Json(RenewablePercentage {
        renewable_percentage: k.renewable_percentage,
    }))
}

pub async fn battery_efficiency(State(st): State<AppState>) -> ApiResult<BatteryEfficiency> {
    let k = st.kpis.production(st.today()).await?;
    Ok(Json(BatteryEfficiency {
        battery_efficiency: k.battery_efficiency,
    }))
}

pub async fn fuel_cell_reliability(State(st): State<AppState>) -> ApiResult<FuelCellReliability> {
    let k = st.kpis.production(st.today()).await?;
    Ok(Json(FuelCellReliability {
        fuel_cell_reliability: k.fuel_cell_reliability,
    }))
}

pub async fn kpis(State(st): State<AppState>) -> ApiResult<ProductionKpis> {
    Ok(Json(st.kpis.production(st.today()).await?))
}
