//! PostgreSQL record store

use super::{PutOutcome, RecordStore, StoreResult};
use crate::models::AnimeRecord;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

/// Record store backed by the `anime` table
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn get(&self, anime_id: i32) -> StoreResult<Option<AnimeRecord>> {
        let record = sqlx::query_as::<_, AnimeRecord>(
            r#"
            SELECT id, title, title_english, title_japanese
            FROM anime
            WHERE id = $1
            "#,
        )
        .bind(anime_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn put(&self, record: &AnimeRecord) -> StoreResult<PutOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO anime (id, title, title_english, title_japanese)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.title_english)
        .bind(&record.title_japanese)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(anime_id = record.id, "Record already cached, insert skipped");
            Ok(PutOutcome::AlreadyPresent)
        } else {
            Ok(PutOutcome::Inserted)
        }
    }

    fn store_name(&self) -> &'static str {
        "postgres"
    }
}
