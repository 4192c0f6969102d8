//! Submission assembler: the terminal action of the application form.
//!
//! Collaborators are injected as trait objects. The assembler awaits them
//! strictly in sequence and fails fast: identity lookup, photo upload,
//! signature upload, then one insert. Preconditions on the draft are checked
//! before any collaborator is touched. Objects uploaded by a failed attempt
//! are not removed.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use crate::draft::{
    ApplicationDraft, Attachment, Certification, CreativeWork, Education, Invention,
    LifelongLearning, ProfessionalDevelopment, Publication, Recognition, SelfAssessment,
    TrainingEntry, WorkExperience,
};
use crate::types::DbId;
use crate::validation;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Failure reported by an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

/// The signed-in account, as supplied by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub user_id: DbId,
    pub display_name: String,
    pub email: String,
}

/// Resolves an authenticated account to its applicant record.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_applicant(&self, email: &str) -> Result<Option<DbId>, CollaboratorError>;
}

/// Object storage accepting overwrites by path.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` at `path`, returning the stored path.
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, CollaboratorError>;

    fn public_url(&self, path: &str) -> String;
}

/// Single atomic insert of a submitted application.
#[async_trait]
pub trait ApplicationSink: Send + Sync {
    async fn insert(&self, record: &ApplicationRecord) -> Result<DbId, CollaboratorError>;
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("A signature is required")]
    SignatureRequired,

    #[error("The signature image is invalid: {0}")]
    InvalidSignature(String),

    #[error("A photo is required")]
    PhotoRequired,

    #[error("No applicant profile is linked to {email}")]
    IdentityNotLinked { email: String },

    #[error("Applicant lookup failed: {0}")]
    IdentityLookup(CollaboratorError),

    #[error("{what} upload failed: {source}")]
    Upload {
        what: &'static str,
        source: CollaboratorError,
    },

    #[error("Saving the application failed: {0}")]
    Insert(CollaboratorError),
}

impl SubmissionError {
    /// The single message shown to the applicant.
    pub fn user_message(&self) -> String {
        match self {
            Self::SignatureRequired => "Please sign the application before submitting.".into(),
            Self::InvalidSignature(_) => "The signature could not be read. Please sign again.".into(),
            Self::PhotoRequired => validation::PHOTO_REQUIRED_MESSAGE.into(),
            Self::IdentityNotLinked { .. } => {
                "Your account is not linked to an applicant profile. Please contact the admissions office."
                    .into()
            }
            Self::IdentityLookup(_) | Self::Upload { .. } | Self::Insert(_) => {
                format!("Submission failed: {self}")
            }
        }
    }

    /// Whether the failure happened before any collaborator was called.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::SignatureRequired | Self::InvalidSignature(_) | Self::PhotoRequired
        )
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// The flat row written for one submitted application.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRecord {
    pub applicant_id: DbId,
    pub name: String,
    pub degree_program: String,
    pub campus: String,
    pub application_date: String,
    pub folder_link: String,
    pub address: String,
    pub mobile_number: String,
    pub email: String,
    pub degree_choices: Vec<String>,
    pub goal_statement: String,
    pub education: Education,
    pub non_formal_education: Vec<TrainingEntry>,
    pub certifications: Vec<Certification>,
    pub publications: Vec<Publication>,
    pub inventions: Vec<Invention>,
    pub work_experience: WorkExperience,
    pub recognitions: Vec<Recognition>,
    pub professional_development: ProfessionalDevelopment,
    pub creative_works: Vec<CreativeWork>,
    pub lifelong_learning: LifelongLearning,
    pub self_assessment: SelfAssessment,
    pub photo_url: String,
    pub signature_url: String,
}

impl ApplicationRecord {
    /// Merge every draft slice with the resolved applicant and object URLs.
    ///
    /// Blank degree choices are dropped; text fields are trimmed.
    pub fn assemble(
        draft: &ApplicationDraft,
        applicant_id: DbId,
        photo_url: String,
        signature_url: String,
    ) -> Self {
        let p = &draft.personal_info;
        Self {
            applicant_id,
            name: p.name.trim().to_string(),
            degree_program: p.degree_program.trim().to_string(),
            campus: p.campus.trim().to_string(),
            application_date: p.application_date.trim().to_string(),
            folder_link: p.folder_link.trim().to_string(),
            address: p.address.trim().to_string(),
            mobile_number: p.mobile_number.trim().to_string(),
            email: p.email.trim().to_string(),
            degree_choices: draft
                .goals
                .degree_choices
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect(),
            goal_statement: draft.goals.statement.trim().to_string(),
            education: draft.education.clone(),
            non_formal_education: draft.non_formal_education.clone(),
            certifications: draft.certifications.clone(),
            publications: draft.publications.clone(),
            inventions: draft.inventions.clone(),
            work_experience: draft.work_experience.clone(),
            recognitions: draft.recognitions.clone(),
            professional_development: draft.professional_development.clone(),
            creative_works: draft.creative_works.clone(),
            lifelong_learning: draft.lifelong_learning.clone(),
            self_assessment: draft.self_assessment.clone(),
            photo_url,
            signature_url,
        }
    }
}

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub application_id: DbId,
    pub applicant_id: DbId,
    pub photo_url: String,
    pub signature_url: String,
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct SubmissionAssembler {
    identities: Arc<dyn IdentityDirectory>,
    storage: Arc<dyn ObjectStorage>,
    sink: Arc<dyn ApplicationSink>,
}

impl SubmissionAssembler {
    pub fn new(
        identities: Arc<dyn IdentityDirectory>,
        storage: Arc<dyn ObjectStorage>,
        sink: Arc<dyn ApplicationSink>,
    ) -> Self {
        Self {
            identities,
            storage,
            sink,
        }
    }

    /// Check the draft, resolve the applicant, upload both images and
    /// insert the record.
    pub async fn submit(
        &self,
        draft: &ApplicationDraft,
        identity: &AuthenticatedIdentity,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let signature = check_signature(draft.signature.as_ref())?;
        let photo = match &draft.photo {
            Some(p) if !p.is_empty() => p,
            _ => return Err(SubmissionError::PhotoRequired),
        };

        let applicant_id = self
            .identities
            .find_applicant(&identity.email)
            .await
            .map_err(SubmissionError::IdentityLookup)?
            .ok_or_else(|| SubmissionError::IdentityNotLinked {
                email: identity.email.clone(),
            })?;

        let stamp = Utc::now().timestamp_millis();

        let photo_path = format!("photos/{applicant_id}/photo-{stamp}.{}", photo.extension());
        let photo_path = self
            .storage
            .upload(&photo_path, &photo.bytes, &photo.content_type)
            .await
            .map_err(|source| SubmissionError::Upload {
                what: "Photo",
                source,
            })?;
        let photo_url = self.storage.public_url(&photo_path);

        let signature_path = format!("signatures/{applicant_id}/signature-{stamp}.png");
        let signature_path = self
            .storage
            .upload(&signature_path, &signature.bytes, "image/png")
            .await
            .map_err(|source| SubmissionError::Upload {
                what: "Signature",
                source,
            })?;
        let signature_url = self.storage.public_url(&signature_path);

        let record = ApplicationRecord::assemble(
            draft,
            applicant_id,
            photo_url.clone(),
            signature_url.clone(),
        );
        let application_id = self
            .sink
            .insert(&record)
            .await
            .map_err(SubmissionError::Insert)?;

        tracing::info!(
            application_id,
            applicant_id,
            user_id = identity.user_id,
            "Application submitted",
        );

        Ok(SubmissionReceipt {
            application_id,
            applicant_id,
            photo_url,
            signature_url,
        })
    }
}

fn check_signature(signature: Option<&Attachment>) -> Result<&Attachment, SubmissionError> {
    let signature = match signature {
        Some(s) if !s.is_empty() => s,
        _ => return Err(SubmissionError::SignatureRequired),
    };
    match validation::signature_is_blank(&signature.bytes) {
        Ok(true) => Err(SubmissionError::SignatureRequired),
        Ok(false) => Ok(signature),
        Err(msg) => Err(SubmissionError::InvalidSignature(msg)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::validation::tests::{complete_draft, png};
    use assert_matches::assert_matches;
    use std::sync::Mutex;

    /// Records every collaborator call in order.
    #[derive(Default)]
    pub(crate) struct Fakes {
        pub calls: Mutex<Vec<String>>,
        pub applicant: Option<DbId>,
        pub fail_upload: bool,
        pub fail_insert: bool,
        /// Holds the identity lookup open for this long.
        pub lookup_delay: Option<std::time::Duration>,
    }

    impl Fakes {
        pub(crate) fn linked(applicant: DbId) -> Arc<Self> {
            Arc::new(Self {
                applicant: Some(applicant),
                ..Default::default()
            })
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl IdentityDirectory for Fakes {
        async fn find_applicant(&self, email: &str) -> Result<Option<DbId>, CollaboratorError> {
            self.record(format!("lookup {email}"));
            if let Some(delay) = self.lookup_delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.applicant)
        }
    }

    #[async_trait]
    impl ObjectStorage for Fakes {
        async fn upload(
            &self,
            path: &str,
            _bytes: &[u8],
            _content_type: &str,
        ) -> Result<String, CollaboratorError> {
            self.record(format!("upload {path}"));
            if self.fail_upload {
                return Err(CollaboratorError("bucket unavailable".into()));
            }
            Ok(path.to_string())
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://cdn.test/{path}")
        }
    }

    #[async_trait]
    impl ApplicationSink for Fakes {
        async fn insert(&self, record: &ApplicationRecord) -> Result<DbId, CollaboratorError> {
            self.record(format!("insert {}", record.applicant_id));
            if self.fail_insert {
                return Err(CollaboratorError("connection reset".into()));
            }
            Ok(501)
        }
    }

    pub(crate) fn assembler(fakes: &Arc<Fakes>) -> SubmissionAssembler {
        SubmissionAssembler::new(fakes.clone(), fakes.clone(), fakes.clone())
    }

    pub(crate) fn identity() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user_id: 9,
            display_name: "Maria Santos".into(),
            email: "maria@example.com".into(),
        }
    }

    pub(crate) fn signed_draft() -> ApplicationDraft {
        let mut draft = complete_draft();
        draft.signature = Some(Attachment::new(png(16, 8, true), "image/png"));
        draft
    }

    #[tokio::test]
    async fn submit_runs_collaborators_in_order() {
        let fakes = Fakes::linked(42);
        let receipt = assembler(&fakes)
            .submit(&signed_draft(), &identity())
            .await
            .unwrap();

        assert_eq!(receipt.application_id, 501);
        assert_eq!(receipt.applicant_id, 42);
        assert!(receipt.photo_url.starts_with("https://cdn.test/photos/42/photo-"));
        assert!(receipt.photo_url.ends_with(".png"));
        assert!(receipt
            .signature_url
            .starts_with("https://cdn.test/signatures/42/signature-"));

        let calls = fakes.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0], "lookup maria@example.com");
        assert!(calls[1].starts_with("upload photos/42/"));
        assert!(calls[2].starts_with("upload signatures/42/"));
        assert_eq!(calls[3], "insert 42");
    }

    #[tokio::test]
    async fn blank_signature_fails_before_any_call() {
        let fakes = Fakes::linked(42);
        let mut draft = complete_draft();
        draft.signature = Some(Attachment::new(png(16, 8, false), "image/png"));
        let err = assembler(&fakes).submit(&draft, &identity()).await.unwrap_err();
        assert_matches!(err, SubmissionError::SignatureRequired);
        assert!(err.is_precondition());
        assert!(fakes.calls().is_empty());

        draft.signature = None;
        let err = assembler(&fakes).submit(&draft, &identity()).await.unwrap_err();
        assert_matches!(err, SubmissionError::SignatureRequired);
        assert!(fakes.calls().is_empty());
    }

    #[tokio::test]
    async fn undecodable_signature_is_rejected() {
        let fakes = Fakes::linked(42);
        let mut draft = complete_draft();
        draft.signature = Some(Attachment::new(b"not an image".to_vec(), "image/png"));
        let err = assembler(&fakes).submit(&draft, &identity()).await.unwrap_err();
        assert_matches!(err, SubmissionError::InvalidSignature(_));
        assert!(fakes.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_photo_fails_before_any_call() {
        let fakes = Fakes::linked(42);
        let mut draft = signed_draft();
        draft.photo = None;
        let err = assembler(&fakes).submit(&draft, &identity()).await.unwrap_err();
        assert_matches!(err, SubmissionError::PhotoRequired);
        assert!(fakes.calls().is_empty());
    }

    #[tokio::test]
    async fn unlinked_identity_stops_before_uploads() {
        let fakes = Arc::new(Fakes::default());
        let err = assembler(&fakes)
            .submit(&signed_draft(), &identity())
            .await
            .unwrap_err();
        assert_matches!(err, SubmissionError::IdentityNotLinked { ref email } if email == "maria@example.com");
        assert_eq!(fakes.calls(), vec!["lookup maria@example.com".to_string()]);
    }

    #[tokio::test]
    async fn upload_failure_skips_insert() {
        let fakes = Arc::new(Fakes {
            applicant: Some(42),
            fail_upload: true,
            ..Default::default()
        });
        let err = assembler(&fakes)
            .submit(&signed_draft(), &identity())
            .await
            .unwrap_err();
        assert_matches!(err, SubmissionError::Upload { what: "Photo", .. });
        assert_eq!(
            err.user_message(),
            "Submission failed: Photo upload failed: bucket unavailable"
        );
        assert_eq!(fakes.calls().len(), 2);
    }

    #[tokio::test]
    async fn insert_failure_is_reported() {
        let fakes = Arc::new(Fakes {
            applicant: Some(42),
            fail_insert: true,
            ..Default::default()
        });
        let err = assembler(&fakes)
            .submit(&signed_draft(), &identity())
            .await
            .unwrap_err();
        assert_matches!(err, SubmissionError::Insert(_));
        assert!(err.user_message().starts_with("Submission failed: "));
        assert_eq!(fakes.calls().len(), 4);
    }

    #[test]
    fn record_flattens_draft() {
        let mut draft = complete_draft();
        draft.goals.degree_choices = vec![" BSBA ".into(), "".into(), "BSA".into()];
        let record = ApplicationRecord::assemble(&draft, 3, "p".into(), "s".into());
        assert_eq!(record.degree_choices, vec!["BSBA".to_string(), "BSA".to_string()]);
        assert_eq!(record.name, "Maria Santos");
        assert_eq!(record.application_date, "2026-08-01");
        assert_eq!(record.education, draft.education);
        assert_eq!(record.photo_url, "p");
    }
}
