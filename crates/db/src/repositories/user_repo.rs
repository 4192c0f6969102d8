//! Repository for the `users` table.

use admissions_core::types::{DbId, Timestamp};
use sqlx::{PgExecutor, PgPool};

use crate::models::applicant::{Applicant, CreateApplicant};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::repositories::ApplicantRepo;

const COLUMNS: &str = "id, username, email, display_name, password_hash, role_id, is_active, \
                       last_login_at, failed_login_count, locked_until, created_at, updated_at";

/// Accounts for both applicants and admissions staff.
pub struct UserRepo;

impl UserRepo {
    pub async fn create<'e, E>(executor: E, input: &CreateUser) -> Result<User, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO users (username, email, display_name, password_hash, role_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(executor)
            .await
    }

    /// Insert an account and its linked applicant profile in one
    /// transaction. The profile takes the account's display name and email.
    pub async fn create_with_applicant(
        pool: &PgPool,
        input: &CreateUser,
        mobile_number: Option<String>,
    ) -> Result<(User, Applicant), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user = Self::create(&mut *tx, input).await?;
        let applicant = ApplicantRepo::create(
            &mut *tx,
            &CreateApplicant {
                user_id: Some(user.id),
                full_name: user.display_name.clone(),
                email: user.email.clone(),
                mobile_number,
            },
        )
        .await?;

        tx.commit().await?;
        Ok((user, applicant))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Login lookup: matches either the username or the email.
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1 OR email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(login)
            .fetch_optional(pool)
            .await
    }

    /// Accounts holding `role_name`, newest first.
    pub async fn list_by_role(pool: &PgPool, role_name: &str) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users
             WHERE role_id = (SELECT id FROM roles WHERE name = $1)
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(role_name)
            .fetch_all(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`. Returns `None` if the row is missing.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                display_name = COALESCE($4, display_name),
                role_id = COALESCE($5, role_id),
                is_active = COALESCE($6, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(&input.username)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(input.role_id)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Set `is_active = false`. Returns `true` if an active row was changed.
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET is_active = false WHERE id = $1 AND is_active = true")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Bump the failed-login counter and return its new value.
    pub async fn increment_failed_login(pool: &PgPool, id: DbId) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE users SET failed_login_count = failed_login_count + 1
             WHERE id = $1
             RETURNING failed_login_count",
        )
        .bind(id)
        .fetch_one(pool)
        .await
    }

    pub async fn lock_account(
        pool: &PgPool,
        id: DbId,
        until: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET locked_until = $2 WHERE id = $1")
            .bind(id)
            .bind(until)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Reset the lockout state and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn update_password(
        pool: &PgPool,
        id: DbId,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, failed_login_count = 0, locked_until = NULL
             WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
