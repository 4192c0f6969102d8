//! Autosave key-value rows.

use admissions_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `draft_store` table.
#[derive(Debug, Clone, FromRow)]
pub struct DraftEntry {
    pub id: DbId,
    pub owner_id: DbId,
    pub key: String,
    pub value: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
