#![cfg(feature = "db")]

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::ConsumerStore;
use crate::domain::{Consumer, NewConsumer};

pub struct PgConsumerStore {
    pool: PgPool,
}

impl PgConsumerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConsumerStore for PgConsumerStore {
    async fn create(&self, consumer: NewConsumer) -> Result<Consumer> {
        let row = sqlx::query_as::<_, Consumer>(
            r#"
            INSERT INTO consumers (name, type, latitude, longitude)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, type, latitude, longitude
            "#,
        )
        .bind(&consumer.name)
        .bind(&consumer.kind)
        .bind(consumer.latitude)
        .bind(consumer.longitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_bulk(&self, consumers: Vec<NewConsumer>) -> Result<Vec<Consumer>> {
        if consumers.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder =
            QueryBuilder::<Postgres>::new("INSERT INTO consumers (name, type, latitude, longitude) ");
        builder.push_values(&consumers, |mut b, c| {
            b.push_bind(&c.name)
                .push_bind(&c.kind)
                .push_bind(c.latitude)
                .push_bind(c.longitude);
        });
        builder.push(" RETURNING id, name, type, latitude, longitude");

        let mut rows: Vec<Consumer> = builder.build_query_as().fetch_all(&self.pool).await?;
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    async fn list(&self) -> Result<Vec<Consumer>> {
        let rows = sqlx::query_as::<_, Consumer>(
            "SELECT id, name, type, latitude, longitude FROM consumers ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Consumer>> {
        let row = sqlx::query_as::<_, Consumer>(
            "SELECT id, name, type, latitude, longitude FROM consumers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: i32, consumer: NewConsumer) -> Result<Option<Consumer>> {
        let row = sqlx::query_as::<_, Consumer>(
            r#"
            UPDATE consumers
            SET name = $2, type = $3, latitude = $4, longitude = $5
            WHERE id = $1
            RETURNING id, name, type, latitude, longitude
            "#,
        )
        .bind(id)
        .bind(&consumer.name)
        .bind(&consumer.kind)
        .bind(consumer.latitude)
        .bind(consumer.longitude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        let result = sqlx::query("DELETE FROM consumers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
