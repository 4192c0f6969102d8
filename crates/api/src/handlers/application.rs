//! Handlers for the `/application` resource: the applicant's intake form.
//!
//! Every call routes through the caller's live
//! [`WizardSession`], held in [`WizardSessions`](crate::sessions::WizardSessions).

use std::sync::Arc;

use admissions_core::consent::{ConsentDecision, CONSENT_NOTICE};
use admissions_core::draft::{Attachment, DraftPatch, DraftSlice, EntryList};
use admissions_core::error::CoreError;
use admissions_core::persistence::PersistenceBridge;
use admissions_core::session::{submit_detached, SessionSnapshot, WizardSession};
use admissions_core::submission::{AuthenticatedIdentity, SubmissionReceipt};
use admissions_core::types::DbId;
use admissions_core::validation::{validate_photo, FieldErrors};
use admissions_core::wizard::{WizardError, WizardState};
use admissions_db::repositories::UserRepo;
use admissions_db::stores::PgDraftStore;
use admissions_events::bus::APPLICATION_SUBMITTED;
use admissions_events::{EmailTemplate, Notification, PlatformEvent};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::sessions::SharedSession;
use crate::state::AppState;

/// Key prefix for the autosave entries in `draft_store`.
pub const DRAFT_NAMESPACE: &str = "admissions";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: SessionSnapshot,
    /// Present while the consent gate is showing.
    pub consent_notice: Option<&'static str>,
}

impl SessionView {
    fn of(session: &WizardSession) -> Self {
        let consent_notice = matches!(session.state(), WizardState::AwaitingConsent { .. })
            .then_some(CONSENT_NOTICE);
        Self {
            session: session.snapshot(),
            consent_notice,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequest {
    pub agree: bool,
}

#[derive(Debug, Serialize)]
pub struct EntryCountResponse {
    pub list: &'static str,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub receipt: SubmissionReceipt,
    pub session: SessionView,
}

// ---------------------------------------------------------------------------
// Session lifecycle
// ---------------------------------------------------------------------------

/// POST /api/v1/application/session
///
/// Mount the form: rehydrate the stored draft and apply the consent gate.
/// Replaces any live session of the caller.
pub async fn open_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<(StatusCode, Json<DataResponse<SessionView>>)> {
    let store = Arc::new(PgDraftStore::new(state.pool.clone(), user.user_id));
    let bridge = PersistenceBridge::new(store, DRAFT_NAMESPACE);
    let session = WizardSession::open(bridge, state.config.consent_policy).await?;
    let view = SessionView::of(&session);
    state.sessions.insert(user.user_id, session).await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /api/v1/application/session
pub async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let shared = live_session(&state, user.user_id).await?;
    let session = shared.lock().await;
    Ok(Json(DataResponse {
        data: SessionView::of(&session),
    }))
}

/// DELETE /api/v1/application/session
///
/// Drop the live session. The stored draft is untouched.
pub async fn close_session(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    if state.sessions.remove(user.user_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(user.user_id))
    }
}

/// POST /api/v1/application/consent
pub async fn decide_consent(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ConsentRequest>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let shared = live_session(&state, user.user_id).await?;
    let mut session = shared.lock().await;
    session
        .decide_consent(ConsentDecision::from(input.agree))
        .await?;
    Ok(Json(DataResponse {
        data: SessionView::of(&session),
    }))
}

// ---------------------------------------------------------------------------
// Editing
// ---------------------------------------------------------------------------

/// PUT /api/v1/application/draft/{slice}
///
/// Replace one slice of the draft. The slice must belong to the current step.
pub async fn update_slice(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slice): Path<String>,
    Json(value): Json<serde_json::Value>,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let slice = DraftSlice::from_name(&slice)?;
    let patch = DraftPatch::from_json(slice, value)?;

    let shared = live_session(&state, user.user_id).await?;
    let mut session = shared.lock().await;
    session.update(patch).await?;
    Ok(Json(DataResponse {
        data: SessionView::of(&session),
    }))
}

/// POST /api/v1/application/draft/entries/{list}
pub async fn push_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(list): Path<String>,
) -> AppResult<(StatusCode, Json<DataResponse<EntryCountResponse>>)> {
    let list = EntryList::from_name(&list)?;
    let shared = live_session(&state, user.user_id).await?;
    let count = shared.lock().await.push_entry(list).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: EntryCountResponse {
                list: list.as_str(),
                count,
            },
        }),
    ))
}

/// DELETE /api/v1/application/draft/entries/{list}/{index}
pub async fn remove_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path((list, index)): Path<(String, usize)>,
) -> AppResult<Json<DataResponse<EntryCountResponse>>> {
    let list = EntryList::from_name(&list)?;
    let shared = live_session(&state, user.user_id).await?;
    let count = shared.lock().await.remove_entry(list, index).await?;
    Ok(Json(DataResponse {
        data: EntryCountResponse {
            list: list.as_str(),
            count,
        },
    }))
}

/// PUT /api/v1/application/photo
///
/// Multipart upload with a single `photo` part (PNG, JPEG or WebP). The
/// photo lives only in the live session and is never autosaved.
pub async fn upload_photo(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let mut photo = read_attachment(multipart, "photo").await?;
    let content_type = validate_photo(&photo).map_err(|msg| {
        let mut fields = FieldErrors::new();
        fields.add("photo", msg);
        AppError::Invalid(fields)
    })?;
    photo.content_type = content_type.to_string();

    let shared = live_session(&state, user.user_id).await?;
    let mut session = shared.lock().await;
    session.set_photo(Some(photo))?;
    tracing::info!(user_id = user.user_id, "Photo attached");
    Ok(Json(DataResponse {
        data: SessionView::of(&session),
    }))
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// POST /api/v1/application/advance
///
/// Validate the current step and move on. A failed validation returns 400
/// with the inline messages in `fields` and leaves the step unchanged.
pub async fn advance(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let shared = live_session(&state, user.user_id).await?;
    let mut session = shared.lock().await;
    session.advance().await?;
    Ok(Json(DataResponse {
        data: SessionView::of(&session),
    }))
}

/// POST /api/v1/application/retreat
pub async fn retreat(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<SessionView>>> {
    let shared = live_session(&state, user.user_id).await?;
    let mut session = shared.lock().await;
    session.retreat().await?;
    Ok(Json(DataResponse {
        data: SessionView::of(&session),
    }))
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// POST /api/v1/application/submit
///
/// Multipart with a `signature` part (PNG canvas export). A second submit
/// while one is in flight is rejected with 409.
pub async fn submit(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<SubmitResponse>>> {
    let signature = read_attachment(multipart, "signature").await?;
    let identity = load_identity(&state, user.user_id).await?;

    let shared = live_session(&state, user.user_id).await?;
    let guard = shared
        .try_lock_owned()
        .map_err(|_| WizardError::SubmissionInProgress)?;

    // The submission and its event run on their own task; a dropped request
    // does not cut them short.
    let event_bus = Arc::clone(&state.event_bus);
    let recipient_email = identity.email.clone();
    let actor_id = user.user_id;
    let (session, receipt) = submit_detached(
        guard,
        signature,
        identity,
        state.assembler.clone(),
        move |session, receipt| {
            let draft = session.controller().draft();
            let notification = Notification {
                recipient_email,
                template: EmailTemplate::SubmissionReceived {
                    applicant_name: draft.personal_info.name.trim().to_string(),
                    application_id: receipt.application_id,
                    degree_program: draft.personal_info.degree_program.trim().to_string(),
                },
            };
            event_bus.publish(
                PlatformEvent::new(APPLICATION_SUBMITTED)
                    .with_source("application", receipt.application_id)
                    .with_actor(actor_id)
                    .with_notification(&notification),
            );
        },
    )
    .await?;

    Ok(Json(DataResponse {
        data: SubmitResponse {
            receipt,
            session: SessionView::of(&session),
        },
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn live_session(state: &AppState, user_id: DbId) -> AppResult<SharedSession> {
    state
        .sessions
        .get(user_id)
        .await
        .ok_or_else(|| session_not_found(user_id))
}

fn session_not_found(user_id: DbId) -> AppError {
    CoreError::NotFound {
        entity: "Wizard session for user",
        id: user_id,
    }
    .into()
}

async fn load_identity(state: &AppState, user_id: DbId) -> AppResult<AuthenticatedIdentity> {
    let user = UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| CoreError::Unauthorized("User no longer exists".into()))?;
    Ok(AuthenticatedIdentity {
        user_id: user.id,
        display_name: user.display_name,
        email: user.email,
    })
}

/// Read the first multipart part named `name`.
async fn read_attachment(mut multipart: Multipart, name: &str) -> AppResult<Attachment> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some(name) {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read '{name}': {e}")))?;

        let attachment = Attachment::new(bytes.to_vec(), content_type);
        return Ok(match file_name {
            Some(file_name) => attachment.with_file_name(file_name),
            None => attachment,
        });
    }
    Err(AppError::BadRequest(format!("Missing multipart field '{name}'")))
}
