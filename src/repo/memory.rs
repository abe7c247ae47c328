//! In-process stores backing tests and database-less runs.

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::{ConsumerStore, MeasurementStore};
use crate::domain::{Consumer, Measurement, NewConsumer};

#[derive(Default)]
pub struct MemoryMeasurementStore {
    rows: RwLock<Vec<Measurement>>,
}

impl MemoryMeasurementStore {
    pub fn with_rows(rows: Vec<Measurement>) -> Self {
        let mut rows = rows;
        rows.sort_by_key(|m| m.timestamp);
        Self {
            rows: RwLock::new(rows),
        }
    }
}

#[async_trait]
impl MeasurementStore for MemoryMeasurementStore {
    async fn replace_all(&self, mut rows: Vec<Measurement>) -> Result<()> {
        rows.sort_by_key(|m| m.timestamp);
        *self.rows.write().await = rows;
        Ok(())
    }

    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<Measurement>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|m| m.timestamp.date() == date)
            .cloned()
            .collect())
    }

    async fn query_latest_by_date(&self, date: NaiveDate) -> Result<Option<Measurement>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .rev()
            .find(|m| m.timestamp.date() == date)
            .cloned())
    }

    async fn query_all(&self) -> Result<Vec<Measurement>> {
        Ok(self.rows.read().await.clone())
    }
}

#[derive(Default)]
struct ConsumerTable {
    last_id: i32,
    rows: BTreeMap<i32, Consumer>,
}

impl ConsumerTable {
    fn insert(&mut self, consumer: NewConsumer) -> Consumer {
        self.last_id += 1;
        let created = consumer.into_consumer(self.last_id);
        self.rows.insert(created.id, created.clone());
        created
    }
}

#[derive(Default)]
pub struct MemoryConsumerStore {
    table: RwLock<ConsumerTable>,
}

#[async_trait]
impl ConsumerStore for MemoryConsumerStore {
    async fn create(&self, consumer: NewConsumer) -> Result<Consumer> {
        Ok(self.table.write().await.insert(consumer))
    }

    async fn create_bulk(&self, consumers: Vec<NewConsumer>) -> Result<Vec<Consumer>> {
        let mut table = self.table.write().await;
        Ok(consumers.into_iter().map(|c| table.insert(c)).collect())
    }

    async fn list(&self) -> Result<Vec<Consumer>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn get(&self, id: i32) -> Result<Option<Consumer>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i32, consumer: NewConsumer) -> Result<Option<Consumer>> {
        let mut table = self.table.write().await;
        Ok(table.rows.get_mut(&id).map(|slot| {
            *slot = consumer.into_consumer(id);
            slot.clone()
        }))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}
