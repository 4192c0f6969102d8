//! Handlers for the `/auth` resource (register, login, refresh, logout, me).

use admissions_core::error::CoreError;
use admissions_core::roles::ROLE_APPLICANT;
use admissions_core::types::DbId;
use admissions_core::validation::validate_mobile_number;
use admissions_db::models::applicant::Applicant;
use admissions_db::models::session::CreateSession;
use admissions_db::models::user::{CreateUser, User, UserResponse};
use admissions_db::repositories::{ApplicantRepo, RoleRepo, SessionRepo, UserRepo};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Consecutive failed logins before the account is locked.
pub const MAX_FAILED_ATTEMPTS: i32 = 5;

pub const LOCK_DURATION_MINS: i64 = 15;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3 to 50 characters."))]
    pub username: String,
    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, max = 200, message = "Full name is required."))]
    pub full_name: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters long."))]
    pub password: String,
    pub mobile_number: Option<String>,
}

/// `username` may also be the account email.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    /// The linked applicant profile, if any.
    pub applicant: Option<Applicant>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Applicant sign-up: creates the account and its applicant profile, then
/// signs in.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input.validate()?;
    let mobile_number = match input.mobile_number.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => {
            if let Some(msg) = validate_mobile_number(m) {
                return Err(AppError::BadRequest(msg.to_string()));
            }
            Some(m.to_string())
        }
        _ => None,
    };
    let email = input.email.trim().to_string();

    if ApplicantRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(CoreError::Conflict(format!(
            "An applicant profile already exists for {email}"
        ))
        .into());
    }

    let role = RoleRepo::find_by_name(&state.pool, ROLE_APPLICANT)
        .await?
        .ok_or_else(|| AppError::InternalError("Applicant role is not seeded".into()))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let (user, applicant) = UserRepo::create_with_applicant(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email,
            display_name: input.full_name.trim().to_string(),
            password_hash,
            role_id: role.id,
        },
        mobile_number,
    )
    .await?;

    tracing::info!(user_id = user.id, applicant_id = applicant.id, "Applicant registered");

    let response = create_auth_response(&state, &user, &role.name).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let invalid = || CoreError::Unauthorized("Invalid username or password".into());

    let user = UserRepo::find_by_login(&state.pool, input.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".into()).into());
    }

    if user.is_locked(Utc::now()) {
        return Err(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )
        .into());
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        return Err(invalid().into());
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    tracing::info!(user_id = user.id, role = %role, "User logged in");

    Ok(Json(create_auth_response(&state, &user, &role).await?))
}

/// POST /api/v1/auth/refresh
///
/// Rotates the refresh token: the presented one is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_active_by_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("Invalid or expired refresh token".into()))?;

    SessionRepo::revoke(&state.pool, session.id).await?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("User no longer exists".into()))?;

    if !user.is_active {
        return Err(CoreError::Forbidden("Account is deactivated".into()).into());
    }

    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(create_auth_response(&state, &user, &role).await?))
}

/// POST /api/v1/auth/logout
///
/// Revokes every refresh session of the caller and drops their live wizard
/// session. The stored draft is kept.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, user.user_id).await?;
    state.sessions.remove(user.user_id).await;
    tracing::info!(user_id = user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let account = UserRepo::find_by_id(&state.pool, user.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: user.user_id,
        })?;
    let applicant = ApplicantRepo::find_by_user_id(&state.pool, account.id).await?;
    let role = RoleRepo::resolve_name(&state.pool, account.role_id).await?;

    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from_user(account, role),
            applicant,
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Issue an access token, persist a refresh session and build the response.
async fn create_auth_response(state: &AppState, user: &User, role: &str) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_token, refresh_token_hash) = generate_refresh_token();
    let expires_at =
        Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days);

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            refresh_token_hash,
            expires_at,
            user_agent: None,
            ip_address: None,
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: state.config.jwt.access_token_ttl_secs(),
        user: UserInfo {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: role.to_string(),
        },
    })
}
