//! Submitted application models and DTOs.

use admissions_core::analytics::SubmissionRow;
use admissions_core::application::ApplicationStatus;
use admissions_core::error::CoreError;
use admissions_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full row from the `applications` table.
///
/// Background collections are JSONB and come back untyped; they were
/// validated as typed records before the insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Application {
    pub id: DbId,
    pub applicant_id: DbId,
    pub name: String,
    pub degree_program: String,
    pub campus: String,
    pub application_date: String,
    pub folder_link: String,
    pub address: String,
    pub mobile_number: String,
    pub email: String,
    pub degree_choices: serde_json::Value,
    pub goal_statement: String,
    pub education: serde_json::Value,
    pub non_formal_education: serde_json::Value,
    pub certifications: serde_json::Value,
    pub publications: serde_json::Value,
    pub inventions: serde_json::Value,
    pub work_experience: serde_json::Value,
    pub recognitions: serde_json::Value,
    pub professional_development: serde_json::Value,
    pub creative_works: serde_json::Value,
    pub lifelong_learning: serde_json::Value,
    pub self_assessment: serde_json::Value,
    pub photo_url: String,
    pub signature_url: String,
    pub status: String,
    pub remarks: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Row shape for the admin list view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApplicationSummary {
    pub id: DbId,
    pub applicant_id: DbId,
    pub name: String,
    pub email: String,
    pub degree_program: String,
    pub campus: String,
    pub status: String,
    pub created_at: Timestamp,
}

/// Query parameters for the admin list. Every filter is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFilter {
    pub status: Option<String>,
    pub degree_program: Option<String>,
    pub campus: Option<String>,
    /// Case-insensitive match on name or email.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Columns the dashboard aggregates over.
#[derive(Debug, Clone, FromRow)]
pub struct AnalyticsRow {
    pub status: String,
    pub degree_program: String,
    pub campus: String,
    pub created_at: Timestamp,
}

impl AnalyticsRow {
    pub fn into_submission_row(self) -> Result<SubmissionRow, CoreError> {
        Ok(SubmissionRow {
            status: ApplicationStatus::from_str_db(&self.status)?,
            degree_program: self.degree_program,
            campus: self.campus,
            created_at: self.created_at,
        })
    }
}
