//! Handlers for `/admin/applications`: review of submitted applications.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use admissions_core::application::{validate_remarks, ApplicationStatus};
use admissions_core::error::CoreError;
use admissions_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use admissions_core::types::DbId;
use admissions_db::models::application::{Application, ApplicationFilter, ApplicationSummary};
use admissions_db::repositories::ApplicationRepo;
use admissions_events::bus::{APPLICATION_MESSAGE, APPLICATION_STATUS_CHANGED};
use admissions_events::{EmailTemplate, Notification, PlatformEvent};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::{DataResponse, PageResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NotifyRequest {
    #[validate(length(min = 1, max = 200, message = "Subject is required."))]
    pub subject: String,
    #[validate(length(min = 1, max = 10000, message = "Message is required."))]
    pub message: String,
}

/// GET /api/v1/admin/applications
///
/// Filters: `status`, `degree_program`, `campus`, `search` (name or email),
/// `limit`, `offset`. Newest first.
pub async fn list_applications(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<ApplicationFilter>,
) -> AppResult<Json<PageResponse<ApplicationSummary>>> {
    if let Some(status) = filter.status.as_deref().filter(|s| !s.trim().is_empty()) {
        ApplicationStatus::from_str_db(status.trim())?;
    }

    let data = ApplicationRepo::list(&state.pool, &filter).await?;
    let total = ApplicationRepo::count(&state.pool, &filter).await?;

    Ok(Json(PageResponse {
        data,
        total,
        limit: clamp_limit(filter.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        offset: clamp_offset(filter.offset),
    }))
}

/// GET /api/v1/admin/applications/{id}
pub async fn get_application(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Application>>> {
    let application = find_application(&state, id).await?;
    Ok(Json(DataResponse { data: application }))
}

/// PATCH /api/v1/admin/applications/{id}/status
///
/// Move the application along its review lifecycle and email the applicant.
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DataResponse<Application>>> {
    let next = ApplicationStatus::from_str_db(input.status.trim())?;
    let remarks = input
        .remarks
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());
    if let Some(remarks) = remarks {
        validate_remarks(remarks)?;
    }

    let current = find_application(&state, id).await?;
    ApplicationStatus::from_str_db(&current.status)?.validate_transition(next)?;

    let updated = ApplicationRepo::update_status(
        &state.pool,
        id,
        &current.status,
        next.as_str(),
        remarks,
        admin.user_id,
    )
    .await?;
    let Some(updated) = updated else {
        // Deleted or re-reviewed since it was read.
        find_application(&state, id).await?;
        return Err(CoreError::Conflict(format!(
            "Application {id} was updated by someone else; reload and try again"
        ))
        .into());
    };

    tracing::info!(
        application_id = id,
        from = %current.status,
        to = next.as_str(),
        reviewed_by = admin.user_id,
        "Application status changed"
    );

    let notification = Notification {
        recipient_email: updated.email.clone(),
        template: EmailTemplate::StatusChanged {
            applicant_name: updated.name.clone(),
            application_id: id,
            status_label: next.label().to_string(),
            remarks: remarks.map(str::to_string),
        },
    };
    state.event_bus.publish(
        PlatformEvent::new(APPLICATION_STATUS_CHANGED)
            .with_source("application", id)
            .with_actor(admin.user_id)
            .with_notification(&notification),
    );

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/admin/applications/{id}
pub async fn delete_application(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !ApplicationRepo::delete(&state.pool, id).await? {
        return Err(CoreError::NotFound {
            entity: "Application",
            id,
        }
        .into());
    }
    tracing::info!(application_id = id, deleted_by = admin.user_id, "Application deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/applications/{id}/notify
///
/// Queue a custom email to the applicant. Returns 202; delivery happens in
/// the background.
pub async fn notify_applicant(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<NotifyRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;
    let application = find_application(&state, id).await?;

    let notification = Notification {
        recipient_email: application.email,
        template: EmailTemplate::AdminMessage {
            applicant_name: application.name,
            subject: input.subject,
            message: input.message,
        },
    };
    state.event_bus.publish(
        PlatformEvent::new(APPLICATION_MESSAGE)
            .with_source("application", id)
            .with_actor(admin.user_id)
            .with_notification(&notification),
    );
    tracing::info!(application_id = id, sent_by = admin.user_id, "Applicant message queued");
    Ok(StatusCode::ACCEPTED)
}

async fn find_application(state: &AppState, id: DbId) -> AppResult<Application> {
    Ok(ApplicationRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Application",
            id,
        })?)
}
