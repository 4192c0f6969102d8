//! Applicant profile model.

use admissions_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `applicants` table.
///
/// `user_id` is null for profiles created by staff before the applicant
/// registered an account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Applicant {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub full_name: String,
    pub email: String,
    pub mobile_number: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateApplicant {
    pub user_id: Option<DbId>,
    pub full_name: String,
    pub email: String,
    pub mobile_number: Option<String>,
}
