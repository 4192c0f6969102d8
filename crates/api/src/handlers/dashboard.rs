//! Handler for `/admin/dashboard`.

use admissions_core::analytics::{summarize, DashboardSummary, SubmissionRow};
use admissions_db::repositories::ApplicationRepo;
use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/admin/dashboard
///
/// Totals, per-status/program/campus counts and the monthly series.
pub async fn get_dashboard(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<DashboardSummary>>> {
    let rows = ApplicationRepo::analytics_rows(&state.pool)
        .await?
        .into_iter()
        .map(|row| row.into_submission_row())
        .collect::<Result<Vec<SubmissionRow>, _>>()?;

    Ok(Json(DataResponse {
        data: summarize(&rows),
    }))
}
