use admissions_core::error::CoreError;
use admissions_core::persistence::StoreError;
use admissions_core::session::SessionError;
use admissions_core::submission::SubmissionError;
use admissions_core::validation::FieldErrors;
use admissions_core::wizard::WizardError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Renders `{ "error": msg, "code": CODE }`, plus `"fields"` when inline
/// field messages are available.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Illegal wizard operation or failed step validation.
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Draft store error: {0}")]
    Store(#[from] StoreError),

    /// Request DTO validation with per-field messages.
    #[error("Validation failed: {0}")]
    Invalid(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Wizard(e) => Self::Wizard(e),
            SessionError::Store(e) => Self::Store(e),
            SessionError::Submission(e) => Self::Submission(e),
            SessionError::Interrupted(msg) => Self::InternalError(msg),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| format!("{field} is invalid."));
            fields.add(field.to_string(), message);
        }
        Self::Invalid(fields)
    }
}

struct ErrorParts {
    status: StatusCode,
    code: &'static str,
    message: String,
    fields: Option<FieldErrors>,
}

impl ErrorParts {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            fields: None,
        }
    }

    fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred",
        )
    }

    fn invalid(fields: &FieldErrors) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "VALIDATION_ERROR",
            message: fields.to_string(),
            fields: Some(fields.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let parts = match &self {
            AppError::Core(core) => classify_core_error(core),
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Wizard(err) => classify_wizard_error(err),
            AppError::Submission(err) => classify_submission_error(err),
            AppError::Store(err) => {
                tracing::error!(error = %err, "Draft store error");
                ErrorParts::internal()
            }
            AppError::Invalid(fields) => ErrorParts::invalid(fields),
            AppError::BadRequest(msg) => {
                ErrorParts::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ErrorParts::internal()
            }
        };

        let mut body = json!({
            "error": parts.message,
            "code": parts.code,
        });
        if let Some(fields) = parts.fields {
            body["fields"] = json!(fields);
        }

        (parts.status, axum::Json(body)).into_response()
    }
}

fn classify_core_error(core: &CoreError) -> ErrorParts {
    match core {
        CoreError::NotFound { entity, id } => ErrorParts::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::NotFoundByKey { entity, key } => ErrorParts::new(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} '{key}' not found"),
        ),
        CoreError::Validation(msg) => {
            ErrorParts::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
        }
        CoreError::Conflict(msg) => ErrorParts::new(StatusCode::CONFLICT, "CONFLICT", msg.clone()),
        CoreError::Unauthorized(msg) => {
            ErrorParts::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
        }
        CoreError::Forbidden(msg) => ErrorParts::new(StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            ErrorParts::internal()
        }
    }
}

fn classify_wizard_error(err: &WizardError) -> ErrorParts {
    let (status, code) = match err {
        WizardError::Invalid(fields) => return ErrorParts::invalid(fields),
        WizardError::Edit(core) => return classify_core_error(core),
        WizardError::ConsentRequired => (StatusCode::FORBIDDEN, "CONSENT_REQUIRED"),
        WizardError::Declined => (StatusCode::FORBIDDEN, "CONSENT_DECLINED"),
        WizardError::ConsentAlreadyDecided
        | WizardError::SubmissionInProgress
        | WizardError::AlreadySubmitted
        | WizardError::StaleClearance { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
        WizardError::AtFirstStep
        | WizardError::SubmitRequired
        | WizardError::NotOnConfirmation
        | WizardError::SliceNotOnStep { .. } => (StatusCode::BAD_REQUEST, "INVALID_STEP"),
    };
    ErrorParts::new(status, code, err.to_string())
}

/// Precondition failures are the applicant's to fix; collaborator failures
/// become a single 502 with the user-facing message.
fn classify_submission_error(err: &SubmissionError) -> ErrorParts {
    let (status, code) = match err {
        SubmissionError::SignatureRequired => (StatusCode::BAD_REQUEST, "SIGNATURE_REQUIRED"),
        SubmissionError::InvalidSignature(_) => (StatusCode::BAD_REQUEST, "INVALID_SIGNATURE"),
        SubmissionError::PhotoRequired => (StatusCode::BAD_REQUEST, "PHOTO_REQUIRED"),
        SubmissionError::IdentityNotLinked { .. } => (StatusCode::FORBIDDEN, "IDENTITY_NOT_LINKED"),
        SubmissionError::IdentityLookup(_)
        | SubmissionError::Upload { .. }
        | SubmissionError::Insert(_) => {
            tracing::error!(error = %err, "Submission collaborator failed");
            (StatusCode::BAD_GATEWAY, "SUBMISSION_FAILED")
        }
    };
    ErrorParts::new(status, code, err.user_message())
}

/// Classify a sqlx error.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on constraints named `uq_*` map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> ErrorParts {
    match err {
        sqlx::Error::RowNotFound => {
            ErrorParts::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Resource not found")
        }
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return ErrorParts::new(
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            ErrorParts::internal()
        }
        other => {
            tracing::error!(error = %other, "Database error");
            ErrorParts::internal()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admissions_core::submission::CollaboratorError;
    use http_body_util::BodyExt;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn wizard_validation_carries_fields() {
        let mut fields = FieldErrors::new();
        fields.add("personal_info.email", "Please enter a valid email address.");
        let (status, body) = render(WizardError::Invalid(fields).into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(
            body["fields"]["personal_info.email"],
            "Please enter a valid email address."
        );
    }

    #[tokio::test]
    async fn collaborator_failures_are_bad_gateway_with_user_message() {
        let err = SubmissionError::Upload {
            what: "Photo",
            source: CollaboratorError("bucket unavailable".into()),
        };
        let (status, body) = render(err.into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "SUBMISSION_FAILED");
        assert_eq!(
            body["error"],
            "Submission failed: Photo upload failed: bucket unavailable"
        );
        assert!(body.get("fields").is_none());
    }

    #[tokio::test]
    async fn consent_required_is_forbidden() {
        let (status, body) = render(SessionError::Wizard(WizardError::ConsentRequired).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "CONSENT_REQUIRED");
    }

    #[tokio::test]
    async fn store_errors_are_sanitized() {
        let (status, body) = render(StoreError("connection reset".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An internal error occurred");
    }
}
