#![cfg(feature = "db")]

use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

use super::{consumers::PgConsumerStore, measurements::PgMeasurementStore};
use crate::config::DbConfig;

pub struct PgRepo {
    pub pool: PgPool,
}

impl PgRepo {
    /// Connect and bring the schema up to date.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(&cfg.url)
            .await
            .context("failed to connect to PostgreSQL")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        tracing::info!(max_connections = cfg.max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub fn measurements(&self) -> PgMeasurementStore {
        PgMeasurementStore::new(self.pool.clone())
    }

    pub fn consumers(&self) -> PgConsumerStore {
        PgConsumerStore::new(self.pool.clone())
    }
}
