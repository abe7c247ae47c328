use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    config::Config,
    domain::{Consumer, Measurement, NewConsumer},
};

pub mod memory;

#[cfg(feature = "db")]
pub mod consumers;
#[cfg(feature = "db")]
pub mod measurements;
#[cfg(feature = "db")]
pub mod pg;

/// Persisted hourly measurements. Each import replaces the whole collection.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Drop every stored row and persist `rows` in their place, atomically.
    async fn replace_all(&self, rows: Vec<Measurement>) -> Result<()>;

    /// Rows on `date`, oldest first.
    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<Measurement>>;

    /// Most recent row on `date`.
    async fn query_latest_by_date(&self, date: NaiveDate) -> Result<Option<Measurement>>;

    /// Full history, oldest first.
    async fn query_all(&self) -> Result<Vec<Measurement>>;
}

#[async_trait]
pub trait ConsumerStore: Send + Sync {
    async fn create(&self, consumer: NewConsumer) -> Result<Consumer>;
    async fn create_bulk(&self, consumers: Vec<NewConsumer>) -> Result<Vec<Consumer>>;
    async fn list(&self) -> Result<Vec<Consumer>>;
    async fn get(&self, id: i32) -> Result<Option<Consumer>>;
    async fn update(&self, id: i32, consumer: NewConsumer) -> Result<Option<Consumer>>;
    /// `false` when no consumer had this id.
    async fn delete(&self, id: i32) -> Result<bool>;
}

#[derive(Clone)]
pub struct Repositories {
    pub measurements: Arc<dyn MeasurementStore>,
    pub consumers: Arc<dyn ConsumerStore>,
}

impl Repositories {
    /// PostgreSQL when a database URL is configured, in-memory otherwise.
    pub async fn new(cfg: &Config) -> Result<Self> {
        #[cfg(feature = "db")]
        if !cfg.db.url.is_empty() {
            let repo = pg::PgRepo::connect(&cfg.db).await?;
            return Ok(Self {
                measurements: Arc::new(repo.measurements()),
                consumers: Arc::new(repo.consumers()),
            });
        }

        #[cfg(not(feature = "db"))]
        if !cfg.db.url.is_empty() {
            tracing::warn!("Built without the `db` feature, ignoring db.url");
        }

        tracing::info!("Using in-memory stores");
        Ok(Self::in_memory())
    }

    pub fn in_memory() -> Self {
        Self {
            measurements: Arc::new(memory::MemoryMeasurementStore::default()),
            consumers: Arc::new(memory::MemoryConsumerStore::default()),
        }
    }
}
