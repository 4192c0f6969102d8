//! Repository for the `applications` table.

use admissions_core::pagination::{clamp_limit, clamp_offset, escape_like, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use admissions_core::submission::ApplicationRecord;
use admissions_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::application::{AnalyticsRow, Application, ApplicationFilter, ApplicationSummary};

const COLUMNS: &str = "id, applicant_id, name, degree_program, campus, application_date, \
                       folder_link, address, mobile_number, email, degree_choices, goal_statement, \
                       education, non_formal_education, certifications, publications, inventions, \
                       work_experience, recognitions, professional_development, creative_works, \
                       lifelong_learning, self_assessment, photo_url, signature_url, status, \
                       remarks, reviewed_by, reviewed_at, created_at, updated_at";

const SUMMARY_COLUMNS: &str =
    "id, applicant_id, name, email, degree_program, campus, status, created_at";

pub struct ApplicationRepo;

impl ApplicationRepo {
    /// Insert one submitted record as a single statement. Returns the new id.
    pub async fn create(pool: &PgPool, record: &ApplicationRecord) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO applications (
                applicant_id, name, degree_program, campus, application_date, folder_link,
                address, mobile_number, email, degree_choices, goal_statement, education,
                non_formal_education, certifications, publications, inventions,
                work_experience, recognitions, professional_development, creative_works,
                lifelong_learning, self_assessment, photo_url, signature_url
             ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24
             )
             RETURNING id",
        )
        .bind(record.applicant_id)
        .bind(&record.name)
        .bind(&record.degree_program)
        .bind(&record.campus)
        .bind(&record.application_date)
        .bind(&record.folder_link)
        .bind(&record.address)
        .bind(&record.mobile_number)
        .bind(&record.email)
        .bind(Json(&record.degree_choices))
        .bind(&record.goal_statement)
        .bind(Json(&record.education))
        .bind(Json(&record.non_formal_education))
        .bind(Json(&record.certifications))
        .bind(Json(&record.publications))
        .bind(Json(&record.inventions))
        .bind(Json(&record.work_experience))
        .bind(Json(&record.recognitions))
        .bind(Json(&record.professional_development))
        .bind(Json(&record.creative_works))
        .bind(Json(&record.lifelong_learning))
        .bind(Json(&record.self_assessment))
        .bind(&record.photo_url)
        .bind(&record.signature_url)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Application>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Filtered, paginated admin listing, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationSummary>, sqlx::Error> {
        let limit = clamp_limit(filter.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let offset = clamp_offset(filter.offset);
        let (where_clause, binds, bind_idx) = build_filter(filter);

        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM applications {where_clause} \
             ORDER BY created_at DESC, id DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );
        let mut q = sqlx::query_as::<_, ApplicationSummary>(&query);
        for value in &binds {
            q = q.bind(value.as_str());
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }

    /// Total rows matching `filter`, ignoring pagination.
    pub async fn count(pool: &PgPool, filter: &ApplicationFilter) -> Result<i64, sqlx::Error> {
        let (where_clause, binds, _) = build_filter(filter);
        let query = format!("SELECT COUNT(*)::BIGINT FROM applications {where_clause}");
        let mut q = sqlx::query_scalar::<_, i64>(&query);
        for value in &binds {
            q = q.bind(value.as_str());
        }
        q.fetch_one(pool).await
    }

    /// Set the review status, but only while the row still has status
    /// `expected`. Returns `None` if the row is missing or has moved on.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        expected: &str,
        status: &str,
        remarks: Option<&str>,
        reviewed_by: DbId,
    ) -> Result<Option<Application>, sqlx::Error> {
        let query = format!(
            "UPDATE applications SET
                status = $2,
                remarks = COALESCE($3, remarks),
                reviewed_by = $4,
                reviewed_at = NOW()
             WHERE id = $1 AND status = $5
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&query)
            .bind(id)
            .bind(status)
            .bind(remarks)
            .bind(reviewed_by)
            .bind(expected)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every row's status, program, campus and creation time.
    pub async fn analytics_rows(pool: &PgPool) -> Result<Vec<AnalyticsRow>, sqlx::Error> {
        sqlx::query_as::<_, AnalyticsRow>(
            "SELECT status, degree_program, campus, created_at FROM applications ORDER BY created_at",
        )
        .fetch_all(pool)
        .await
    }
}

/// Build a WHERE clause from the active filters.
///
/// Returns `(where_clause, bind_values, next_bind_index)`; every bind is text.
fn build_filter(filter: &ApplicationFilter) -> (String, Vec<String>, u32) {
    let mut conditions: Vec<String> = Vec::new();
    let mut binds: Vec<String> = Vec::new();
    let mut bind_idx = 1u32;

    let non_blank = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(status) = non_blank(&filter.status) {
        conditions.push(format!("status = ${bind_idx}"));
        bind_idx += 1;
        binds.push(status);
    }

    if let Some(program) = non_blank(&filter.degree_program) {
        conditions.push(format!("degree_program = ${bind_idx}"));
        bind_idx += 1;
        binds.push(program);
    }

    if let Some(campus) = non_blank(&filter.campus) {
        conditions.push(format!("campus = ${bind_idx}"));
        bind_idx += 1;
        binds.push(campus);
    }

    if let Some(search) = non_blank(&filter.search) {
        conditions.push(format!(
            "(name ILIKE ${bind_idx} ESCAPE '\\' OR email ILIKE ${bind_idx} ESCAPE '\\')"
        ));
        bind_idx += 1;
        binds.push(format!("%{}%", escape_like(&search)));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    (where_clause, binds, bind_idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_has_no_where_clause() {
        let (clause, binds, idx) = build_filter(&ApplicationFilter::default());
        assert!(clause.is_empty());
        assert!(binds.is_empty());
        assert_eq!(idx, 1);
    }

    #[test]
    fn filters_are_numbered_in_order() {
        let filter = ApplicationFilter {
            status: Some("pending".into()),
            campus: Some("  ".into()),
            search: Some("100%".into()),
            ..Default::default()
        };
        let (clause, binds, idx) = build_filter(&filter);
        assert_eq!(
            clause,
            "WHERE status = $1 AND (name ILIKE $2 ESCAPE '\\' OR email ILIKE $2 ESCAPE '\\')"
        );
        assert_eq!(binds, vec!["pending".to_string(), "%100\\%%".to_string()]);
        assert_eq!(idx, 3);
    }
}
