use axum::{extract::State, routing::get, Json, Router};

use super::ApiResult;
use crate::{
    kpi::{ContributionPoint, SocPoint, StorageKpis},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/battery_soc", get(battery_soc))
        .route("/fuelcell_contribution", get(fuelcell_contribution))
        .route("/kpis", get(kpis))
}

pub async fn battery_soc(State(st): State<AppState>) -> ApiResult<Vec<SocPoint>> {
    Ok(Json(st.kpis.soc(st.today()).await?))
}

pub async fn fuelcell_contribution(State(st): State<AppState>) -> ApiResult<Vec<ContributionPoint>> {
    Ok(Json(st.kpis.contribution(st.today()).await?))
}

pub async fn kpis(State(st): State<AppState>) -> ApiResult<StorageKpis> {
    Ok(Json(st.kpis.storage(st.today()).await?))
}
