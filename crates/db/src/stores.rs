//! Postgres-backed collaborators for the intake flow.

use admissions_core::persistence::{KeyValueStore, StoreError};
use admissions_core::submission::{
    ApplicationRecord, ApplicationSink, CollaboratorError, IdentityDirectory,
};
use admissions_core::types::DbId;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::repositories::{ApplicantRepo, ApplicationRepo, DraftStoreRepo};

/// The autosave store of one account.
#[derive(Debug, Clone)]
pub struct PgDraftStore {
    pool: PgPool,
    owner_id: DbId,
}

impl PgDraftStore {
    pub fn new(pool: PgPool, owner_id: DbId) -> Self {
        Self { pool, owner_id }
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    tracing::error!(error = %e, "Draft store query failed");
    StoreError(e.to_string())
}

#[async_trait]
impl KeyValueStore for PgDraftStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        DraftStoreRepo::get(&self.pool, self.owner_id, key)
            .await
            .map_err(store_error)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        DraftStoreRepo::upsert(&self.pool, self.owner_id, key, value)
            .await
            .map_err(store_error)
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        DraftStoreRepo::delete(&self.pool, self.owner_id, key)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}

/// Resolves accounts to applicant profiles by email.
#[derive(Debug, Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    async fn find_applicant(&self, email: &str) -> Result<Option<DbId>, CollaboratorError> {
        ApplicantRepo::find_by_email(&self.pool, email)
            .await
            .map(|found| found.map(|a| a.id))
            .map_err(|e| CollaboratorError(e.to_string()))
    }
}

/// Writes submitted applications.
#[derive(Debug, Clone)]
pub struct PgApplicationSink {
    pool: PgPool,
}

impl PgApplicationSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ApplicationSink for PgApplicationSink {
    async fn insert(&self, record: &ApplicationRecord) -> Result<DbId, CollaboratorError> {
        ApplicationRepo::create(&self.pool, record)
            .await
            .map_err(|e| CollaboratorError(e.to_string()))
    }
}
