//! Consumer registry CRUD and CSV export.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use csv::WriterBuilder;
use serde::Serialize;
use validator::Validate;

use super::{ApiError, ApiResult};
use crate::{
    domain::{Consumer, NewConsumer},
    state::AppState,
};

const CSV_HEADER: [&str; 5] = ["id", "name", "type", "latitude", "longitude"];

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_consumers).post(create_consumer))
        .route("/bulk", axum::routing::post(create_consumers_bulk))
        .route("/export_csv", get(export_csv))
        .route(
            "/:id",
            get(get_consumer).put(update_consumer).delete(delete_consumer),
        )
}

fn not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("consumer {id}"))
}

pub async fn create_consumer(
    State(st): State<AppState>,
    Json(payload): Json<NewConsumer>,
) -> ApiResult<Consumer> {
    payload.validate()?;
    let created = st.repos.consumers.create(payload).await?;
    tracing::info!(id = created.id, "Consumer created");
    Ok(Json(created))
}

pub async fn create_consumers_bulk(
    State(st): State<AppState>,
    Json(payload): Json<Vec<NewConsumer>>,
) -> ApiResult<Vec<Consumer>> {
    for c in &payload {
        c.validate()?;
    }
    let created = st.repos.consumers.create_bulk(payload).await?;
    tracing::info!(count = created.len(), "Consumers created");
    Ok(Json(created))
}

pub async fn list_consumers(State(st): State<AppState>) -> ApiResult<Vec<Consumer>> {
    Ok(Json(st.repos.consumers.list().await?))
}

pub async fn get_consumer(State(st): State<AppState>, Path(id): Path<i32>) -> ApiResult<Consumer> {
    st.repos
        .consumers
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

pub async fn update_consumer(
    State(st): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<NewConsumer>,
) -> ApiResult<Consumer> {
    payload.validate()?;
    st.repos
        .consumers
        .update(id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub detail: &'static str,
}

pub async fn delete_consumer(
    State(st): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<DeleteResponse> {
    if !st.repos.consumers.delete(id).await? {
        return Err(not_found(id));
    }
    tracing::info!(id, "Consumer deleted");
    Ok(Json(DeleteResponse {
        detail: "Consumer deleted",
    }))
}

/// Render consumers as CSV with a header line, even when empty.
pub fn consumers_csv(consumers: &[Consumer]) -> anyhow::Result<Vec<u8>> {
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for c in consumers {
        wtr.serialize(c)?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow::anyhow!("csv flush failed: {}", e.error()))
}

pub async fn export_csv(State(st): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let consumers = st.repos.consumers.list().await?;
    let body = consumers_csv(&consumers)?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=consumers.csv"),
        ],
        body,
    ))
}
