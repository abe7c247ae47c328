use axum::{extract::State, routing::get, Json, Router};
use chrono::NaiveDateTime;
use serde::Serialize;

use super::ApiResult;
use crate::{kpi::DistributionKpis, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/consumption_total", get(consumption_total))
        .route("/consumption_breakdown", get(consumption_breakdown))
        .route("/kpis", get(kpis))
}

#[derive(Debug, Serialize)]
pub struct ConsumptionPoint {
    pub timestamp: NaiveDateTime,
    pub ge_power_total: f64,
}

/// Generator body load versus every other load.
#[derive(Debug, Serialize)]
pub struct BreakdownPoint {
    pub timestamp: NaiveDateTime,
    pub ge_body: f64,
    pub other_loads: f64,
}

pub async fn consumption_total(State(st): State<AppState>) -> ApiResult<Vec<ConsumptionPoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| ConsumptionPoint {
                timestamp: m.timestamp,
                ge_power_total: m.ge_power_total,
            })
            .collect(),
    ))
}

pub async fn consumption_breakdown(State(st): State<AppState>) -> ApiResult<Vec<BreakdownPoint>> {
    let rows = st.repos.measurements.query_by_date(st.today()).await?;
    Ok(Json(
        rows.iter()
            .map(|m| BreakdownPoint {
                timestamp: m.timestamp,
                ge_body: m.ge_power_body,
                other_loads: m.ge_power_total - m.ge_power_body,
            })
            .collect(),
    ))
}

pub async fn kpis(State(st): State<AppState>) -> ApiResult<DistributionKpis> {
    Ok(Json(st.kpis.distribution(st.today()).await?))
}
