//! Repository for the `draft_store` table.

use admissions_core::types::DbId;
use sqlx::PgPool;

/// Per-owner string store behind form autosave.
pub struct DraftStoreRepo;

impl DraftStoreRepo {
    pub async fn get(pool: &PgPool, owner_id: DbId, key: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT value FROM draft_store WHERE owner_id = $1 AND key = $2")
            .bind(owner_id)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite one key.
    pub async fn upsert(
        pool: &PgPool,
        owner_id: DbId,
        key: &str,
        value: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO draft_store (owner_id, key, value)
             VALUES ($1, $2, $3)
             ON CONFLICT (owner_id, key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(owner_id)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, owner_id: DbId, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM draft_store WHERE owner_id = $1 AND key = $2")
            .bind(owner_id)
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_owner(pool: &PgPool, owner_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*)::BIGINT FROM draft_store WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(pool)
            .await
    }
}
