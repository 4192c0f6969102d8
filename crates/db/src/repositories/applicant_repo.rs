//! Repository for the `applicants` table.

use admissions_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::applicant::{Applicant, CreateApplicant};

const COLUMNS: &str = "id, user_id, full_name, email, mobile_number, created_at, updated_at";

pub struct ApplicantRepo;

impl ApplicantRepo {
    pub async fn create<'e, E>(executor: E, input: &CreateApplicant) -> Result<Applicant, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO applicants (user_id, full_name, email, mobile_number)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Applicant>(&query)
            .bind(input.user_id)
            .bind(&input.full_name)
            .bind(&input.email)
            .bind(&input.mobile_number)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applicants WHERE id = $1");
        sqlx::query_as::<_, Applicant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Case-insensitive lookup by the stable identifier.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applicants WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, Applicant>(&query)
            .bind(email.trim())
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_user_id(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<Applicant>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applicants WHERE user_id = $1");
        sqlx::query_as::<_, Applicant>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }
}
