#![cfg(feature = "db")]

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::MeasurementStore;
use crate::domain::Measurement;

/// Rows per multi-row INSERT; 18 binds each keeps well under the 65535 limit.
const INSERT_BATCH: usize = 1000;

const SELECT_COLUMNS: &str = "SELECT timestamp, battery_power, battery_set_response, pv_power, \
     ge_power_body, ge_power_total, ge_body_set_response, fc_setpoint, fc_power, fc_set_response, \
     mccb_power, mg_lv_voltage, receiving_voltage, mccb_voltage, mccb_frequency, mg_lv_frequency, \
     temp_inlet, temp_outlet FROM measurements";

pub struct PgMeasurementStore {
    pool: PgPool,
}

impl PgMeasurementStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN);
    (start, start + chrono::Duration::days(1))
}

#[async_trait]
impl MeasurementStore for PgMeasurementStore {
    async fn replace_all(&self, rows: Vec<Measurement>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM measurements")
            .execute(&mut *tx)
            .await
            .context("failed to clear measurements")?;

        for batch in rows.chunks(INSERT_BATCH) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO measurements (timestamp, battery_power, battery_set_response, pv_power, \
                 ge_power_body, ge_power_total, ge_body_set_response, fc_setpoint, fc_power, \
                 fc_set_response, mccb_power, mg_lv_voltage, receiving_voltage, mccb_voltage, \
                 mccb_frequency, mg_lv_frequency, temp_inlet, temp_outlet) ",
            );
            builder.push_values(batch, |mut b, m| {
                b.push_bind(m.timestamp)
                    .push_bind(m.battery_power)
                    .push_bind(m.battery_set_response)
                    .push_bind(m.pv_power)
                    .push_bind(m.ge_power_body)
                    .push_bind(m.ge_power_total)
                    .push_bind(m.ge_body_set_response)
                    .push_bind(m.fc_setpoint)
                    .push_bind(m.fc_power)
                    .push_bind(m.fc_set_response)
                    .push_bind(m.mccb_power)
                    .push_bind(m.mg_lv_voltage)
                    .push_bind(m.receiving_voltage)
                    .push_bind(m.mccb_voltage)
                    .push_bind(m.mccb_frequency)
                    .push_bind(m.mg_lv_frequency)
                    .push_bind(m.temp_inlet)
                    .push_bind(m.temp_outlet);
            });
            builder
                .build()
                .execute(&mut *tx)
                .await
                .context("failed to insert measurement batch")?;
        }

        tx.commit().await?;
        tracing::debug!(rows = rows.len(), "Replaced measurements");
        Ok(())
    }

    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<Measurement>> {
        let (start, end) = day_bounds(date);
        let sql = format!("{SELECT_COLUMNS} WHERE timestamp >= $1 AND timestamp < $2 ORDER BY timestamp");
        let rows = sqlx::query_as::<_, Measurement>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn query_latest_by_date(&self, date: NaiveDate) -> Result<Option<Measurement>> {
        let (start, end) = day_bounds(date);
        let sql = format!(
            "{SELECT_COLUMNS} WHERE timestamp >= $1 AND timestamp < $2 ORDER BY timestamp DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, Measurement>(&sql)
            .bind(start)
            .bind(end)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn query_all(&self) -> Result<Vec<Measurement>> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY timestamp");
        let rows = sqlx::query_as::<_, Measurement>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
