//! Handlers for `/admin/accounts`: staff and applicant account management.
//!
//! All handlers require the `admin` role via [`RequireAdmin`].

use admissions_core::error::CoreError;
use admissions_core::roles::{ROLE_ADMIN, ROLE_APPLICANT};
use admissions_core::types::DbId;
use admissions_db::models::role::Role;
use admissions_db::models::user::{CreateUser, UpdateUser, User, UserResponse};
use admissions_db::repositories::{ApplicantRepo, RoleRepo, SessionRepo, UserRepo};
use admissions_events::bus::ADMIN_ACCOUNT_CREATED;
use admissions_events::{EmailTemplate, Notification, PlatformEvent};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AccountListQuery {
    /// `admin` (default) or `applicant`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters."))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Display name is required."))]
    pub display_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    /// Defaults to `admin`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters."))]
    pub username: Option<String>,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Display name is required."))]
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub new_password: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/accounts
pub async fn list_accounts(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<AccountListQuery>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let role = find_role(&state, query.role.as_deref().unwrap_or(ROLE_ADMIN)).await?;
    let users = UserRepo::list_by_role(&state.pool, &role.name).await?;
    let data = users
        .into_iter()
        .map(|u| UserResponse::from_user(u, role.name.clone()))
        .collect();
    Ok(Json(DataResponse { data }))
}

/// POST /api/v1/admin/accounts
///
/// Applicant accounts also get a linked applicant profile. The new account
/// holder is emailed.
pub async fn create_account(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateAccountRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    input.validate()?;
    let role = find_role(&state, input.role.as_deref().unwrap_or(ROLE_ADMIN)).await?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let account = CreateUser {
        username: input.username.trim().to_string(),
        email: input.email.trim().to_string(),
        display_name: input.display_name.trim().to_string(),
        password_hash,
        role_id: role.id,
    };
    let needs_profile = role.name == ROLE_APPLICANT
        && ApplicantRepo::find_by_email(&state.pool, &account.email)
            .await?
            .is_none();
    let user = if needs_profile {
        UserRepo::create_with_applicant(&state.pool, &account, None)
            .await?
            .0
    } else {
        UserRepo::create(&state.pool, &account).await?
    };

    tracing::info!(
        user_id = user.id,
        role = %role.name,
        created_by = admin.user_id,
        "Account created"
    );

    let notification = Notification {
        recipient_email: user.email.clone(),
        template: EmailTemplate::AccountCreated {
            display_name: user.display_name.clone(),
            username: user.username.clone(),
            role: role.name.clone(),
        },
    };
    state.event_bus.publish(
        PlatformEvent::new(ADMIN_ACCOUNT_CREATED)
            .with_source("user", user.id)
            .with_actor(admin.user_id)
            .with_notification(&notification),
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from_user(user, role.name),
        }),
    ))
}

/// GET /api/v1/admin/accounts/{id}
pub async fn get_account(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "User", id })?;
    Ok(Json(DataResponse {
        data: to_response(&state, user).await?,
    }))
}

/// PUT /api/v1/admin/accounts/{id}
pub async fn update_account(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAccountRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input.validate()?;
    if id == admin.user_id && input.is_active == Some(false) {
        return Err(CoreError::Conflict("You cannot deactivate your own account".into()).into());
    }

    let role_id = match input.role.as_deref() {
        Some(name) => Some(find_role(&state, name).await?.id),
        None => None,
    };

    let user = UserRepo::update(
        &state.pool,
        id,
        &UpdateUser {
            username: input.username.map(|s| s.trim().to_string()),
            email: input.email.map(|s| s.trim().to_string()),
            display_name: input.display_name.map(|s| s.trim().to_string()),
            role_id,
            is_active: input.is_active,
        },
    )
    .await?
    .ok_or(CoreError::NotFound { entity: "User", id })?;

    tracing::info!(user_id = id, updated_by = admin.user_id, "Account updated");
    Ok(Json(DataResponse {
        data: to_response(&state, user).await?,
    }))
}

/// DELETE /api/v1/admin/accounts/{id}
///
/// Soft-deactivates the account and revokes its sessions.
pub async fn deactivate_account(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(CoreError::Conflict("You cannot deactivate your own account".into()).into());
    }
    if !UserRepo::deactivate(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: "User", id }.into());
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    state.sessions.remove(id).await;
    tracing::info!(user_id = id, deactivated_by = admin.user_id, "Account deactivated");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/accounts/{id}/reset-password
///
/// Clears any lockout and signs the account out everywhere.
pub async fn reset_password(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<StatusCode> {
    input.validate()?;
    let hashed = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if !UserRepo::update_password(&state.pool, id, &hashed).await? {
        return Err(CoreError::NotFound { entity: "User", id }.into());
    }
    SessionRepo::revoke_all_for_user(&state.pool, id).await?;
    tracing::info!(user_id = id, reset_by = admin.user_id, "Password reset");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_role(state: &AppState, name: &str) -> AppResult<Role> {
    let name = name.trim();
    Ok(RoleRepo::find_by_name(&state.pool, name)
        .await?
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown role '{name}'. Must be '{ROLE_ADMIN}' or '{ROLE_APPLICANT}'"
            ))
        })?)
}

async fn to_response(state: &AppState, user: User) -> AppResult<UserResponse> {
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(UserResponse::from_user(user, role))
}
