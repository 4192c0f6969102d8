//! One live intake session: a step controller bound to its persistence
//! bridge.
//!
//! Every successful mutation is autosaved while the form is being edited.
//! Nothing is written before consent. The stored draft is cleared on consent
//! rejection and after a successful submission, and kept after a failed one.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::consent::{ConsentDecision, ConsentPolicy};
use crate::draft::{ApplicationDraft, Attachment, DraftPatch, EntryList};
use crate::persistence::{PersistenceBridge, StoreError};
use crate::submission::{
    AuthenticatedIdentity, SubmissionAssembler, SubmissionError, SubmissionReceipt,
};
use crate::wizard::{FormStep, StepController, WizardError, WizardState, TOTAL_STEPS};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Wizard(#[from] WizardError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error("Submission task stopped unexpectedly: {0}")]
    Interrupted(String),
}

/// A session shared between the requests of one account.
pub type SharedSession = Arc<Mutex<WizardSession>>;

/// Serializable view of a session for clients.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub state: &'static str,
    pub step: Option<u8>,
    pub step_label: Option<&'static str>,
    pub total_steps: u8,
    pub consent_policy: ConsentPolicy,
    pub has_photo: bool,
    /// Withheld until consent is given.
    pub draft: Option<ApplicationDraft>,
}

#[derive(Debug)]
pub struct WizardSession {
    controller: StepController,
    bridge: PersistenceBridge,
    policy: ConsentPolicy,
}

impl WizardSession {
    /// Mount the form: rehydrate whatever the bridge holds and decide
    /// whether the consent gate applies.
    pub async fn open(bridge: PersistenceBridge, policy: ConsentPolicy) -> Result<Self, SessionError> {
        let loaded = bridge.load().await?;
        let remembered = match policy {
            ConsentPolicy::Remember => bridge.has_remembered_consent().await?,
            ConsentPolicy::PerSession => false,
        };
        let resumed = loaded.is_some();
        let (draft, step) = loaded.unwrap_or_else(|| (ApplicationDraft::default(), FormStep::FIRST));
        let controller = StepController::resume(draft, step, policy.skips_gate(remembered));

        tracing::info!(
            namespace = %bridge.namespace(),
            resumed,
            step = step.number(),
            gated = !controller.is_consented(),
            "Wizard session opened",
        );

        Ok(Self {
            controller,
            bridge,
            policy,
        })
    }

    pub fn controller(&self) -> &StepController {
        &self.controller
    }

    pub fn state(&self) -> WizardState {
        self.controller.state()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let step = self.controller.current_step();
        SessionSnapshot {
            state: self.controller.state().as_str(),
            step: step.map(FormStep::number),
            step_label: step.map(FormStep::label),
            total_steps: TOTAL_STEPS,
            consent_policy: self.policy,
            has_photo: self.controller.draft().photo.is_some(),
            draft: self
                .controller
                .is_consented()
                .then(|| self.controller.draft().clone()),
        }
    }

    // -- consent ------------------------------------------------------------

    pub async fn decide_consent(&mut self, decision: ConsentDecision) -> Result<WizardState, SessionError> {
        match decision {
            ConsentDecision::Agree => {
                let step = self.controller.agree()?;
                if self.policy == ConsentPolicy::Remember {
                    if let Err(e) = self.bridge.remember_consent().await {
                        tracing::warn!(error = %e, "Failed to remember consent");
                    }
                }
                tracing::info!(namespace = %self.bridge.namespace(), step = step.number(), "Consent given");
                self.autosave().await;
            }
            ConsentDecision::Disagree => {
                self.controller.disagree()?;
                self.bridge.clear().await?;
                tracing::info!(namespace = %self.bridge.namespace(), "Consent declined, draft discarded");
            }
        }
        Ok(self.controller.state())
    }

    // -- editing ------------------------------------------------------------

    pub async fn update(&mut self, patch: DraftPatch) -> Result<(), SessionError> {
        self.controller.update(patch)?;
        self.autosave().await;
        Ok(())
    }

    pub async fn push_entry(&mut self, list: EntryList) -> Result<usize, SessionError> {
        self.controller.push_entry(list)?;
        self.autosave().await;
        Ok(self.controller.draft().entry_count(list))
    }

    pub async fn remove_entry(&mut self, list: EntryList, index: usize) -> Result<usize, SessionError> {
        self.controller.remove_entry(list, index)?;
        self.autosave().await;
        Ok(self.controller.draft().entry_count(list))
    }

    /// Attachments never reach the store, so nothing is autosaved here.
    pub fn set_photo(&mut self, photo: Option<Attachment>) -> Result<(), SessionError> {
        self.controller.set_photo(photo)?;
        Ok(())
    }

    // -- navigation ---------------------------------------------------------

    pub async fn advance(&mut self) -> Result<FormStep, SessionError> {
        let step = self.controller.validate_and_proceed()?;
        tracing::info!(namespace = %self.bridge.namespace(), step = step.number(), "Advanced");
        self.autosave().await;
        Ok(step)
    }

    pub async fn retreat(&mut self) -> Result<FormStep, SessionError> {
        let step = self.controller.retreat()?;
        tracing::info!(namespace = %self.bridge.namespace(), step = step.number(), "Retreated");
        self.autosave().await;
        Ok(step)
    }

    // -- submission ---------------------------------------------------------

    /// Attach the signature and run the assembler.
    ///
    /// On success the stored draft is cleared and the session is complete;
    /// on failure the session returns to the confirmation step.
    pub async fn submit(
        &mut self,
        signature: Attachment,
        identity: &AuthenticatedIdentity,
        assembler: &SubmissionAssembler,
    ) -> Result<SubmissionReceipt, SessionError> {
        self.controller.begin_submit(signature)?;
        tracing::info!(namespace = %self.bridge.namespace(), user_id = identity.user_id, "Submission started");

        match assembler.submit(self.controller.draft(), identity).await {
            Ok(receipt) => {
                self.controller.finish_submit(true);
                if let Err(e) = self.bridge.clear().await {
                    tracing::warn!(error = %e, "Failed to clear stored draft after submission");
                }
                Ok(receipt)
            }
            Err(e) => {
                self.controller.finish_submit(false);
                tracing::warn!(
                    namespace = %self.bridge.namespace(),
                    error = %e,
                    "Submission failed",
                );
                Err(e.into())
            }
        }
    }

    // -- autosave -----------------------------------------------------------

    /// Best-effort write of the draft and step; only while editing.
    async fn autosave(&self) {
        let WizardState::Editing { step } = self.controller.state() else {
            return;
        };
        if let Err(e) = self.bridge.save(self.controller.draft(), step).await {
            tracing::warn!(namespace = %self.bridge.namespace(), error = %e, "Autosave failed");
        }
    }
}

/// Run [`WizardSession::submit`] on its own task.
///
/// The task owns the session guard, so the submission runs to completion and
/// the session settles even when the caller stops waiting. `on_submitted`
/// runs on that task after a successful submission. On success the guard is
/// handed back to the caller.
pub async fn submit_detached<F>(
    mut session: OwnedMutexGuard<WizardSession>,
    signature: Attachment,
    identity: AuthenticatedIdentity,
    assembler: SubmissionAssembler,
    on_submitted: F,
) -> Result<(OwnedMutexGuard<WizardSession>, SubmissionReceipt), SessionError>
where
    F: FnOnce(&WizardSession, &SubmissionReceipt) + Send + 'static,
{
    let task = tokio::spawn(async move {
        let receipt = session.submit(signature, &identity, &assembler).await?;
        on_submitted(&*session, &receipt);
        Ok::<_, SessionError>((session, receipt))
    });
    task.await
        .map_err(|e| SessionError::Interrupted(e.to_string()))?
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Goals, PersonalInfo};
    use crate::persistence::{KeyValueStore, MemoryStore};
    use crate::submission::tests::{assembler, identity, Fakes};
    use crate::validation::tests::{complete_draft, png};
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    const DRAFT: &str = "applicant-1:application_draft";
    const STEP: &str = "applicant-1:application_step";

    async fn open(store: &Arc<MemoryStore>, policy: ConsentPolicy) -> WizardSession {
        let bridge = PersistenceBridge::new(store.clone(), "applicant-1");
        WizardSession::open(bridge, policy).await.unwrap()
    }

    async fn seed(store: &Arc<MemoryStore>, draft: &ApplicationDraft, step: FormStep) {
        PersistenceBridge::new(store.clone(), "applicant-1")
            .save(draft, step)
            .await
            .unwrap();
    }

    /// A consented session on the confirmation step with a photo attached.
    async fn ready_to_submit(store: &Arc<MemoryStore>) -> WizardSession {
        seed(store, &complete_draft(), FormStep::FIRST).await;
        let mut session = open(store, ConsentPolicy::PerSession).await;
        session.decide_consent(ConsentDecision::Agree).await.unwrap();
        session
            .set_photo(Some(Attachment::new(png(4, 4, true), "image/png")))
            .unwrap();
        while session.controller().current_step() != Some(FormStep::Confirmation) {
            session.advance().await.unwrap();
        }
        session
    }

    fn goals() -> DraftPatch {
        DraftPatch::Goals(Goals {
            degree_choices: vec!["BSIT".into()],
            statement: "Grow".into(),
        })
    }

    #[tokio::test]
    async fn nothing_is_saved_before_consent() {
        let store = Arc::new(MemoryStore::new());
        let mut session = open(&store, ConsentPolicy::PerSession).await;
        assert_matches!(
            session.update(goals()).await,
            Err(SessionError::Wizard(WizardError::ConsentRequired))
        );
        assert!(store.is_empty());
        assert!(session.snapshot().draft.is_none());
    }

    #[tokio::test]
    async fn mutations_autosave_after_consent() {
        let store = Arc::new(MemoryStore::new());
        let mut session = open(&store, ConsentPolicy::PerSession).await;
        session.decide_consent(ConsentDecision::Agree).await.unwrap();
        session
            .update(DraftPatch::PersonalInfo(PersonalInfo {
                name: "Ana".into(),
                ..Default::default()
            }))
            .await
            .unwrap();

        let saved = store.get(DRAFT).await.unwrap().unwrap();
        assert!(saved.contains("\"Ana\""));
        assert_eq!(store.get(STEP).await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn reopened_session_resumes_step_behind_gate() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &complete_draft(), FormStep::Education).await;

        let mut session = open(&store, ConsentPolicy::PerSession).await;
        assert_eq!(
            session.state(),
            WizardState::AwaitingConsent {
                resume_step: FormStep::Education
            }
        );
        session.decide_consent(ConsentDecision::Agree).await.unwrap();
        assert_eq!(session.controller().current_step(), Some(FormStep::Education));
        // The photo is not restored.
        assert!(session.controller().draft().photo.is_none());
    }

    #[tokio::test]
    async fn remembered_consent_skips_gate() {
        let store = Arc::new(MemoryStore::new());
        let mut first = open(&store, ConsentPolicy::Remember).await;
        first.decide_consent(ConsentDecision::Agree).await.unwrap();

        let second = open(&store, ConsentPolicy::Remember).await;
        assert_eq!(
            second.state(),
            WizardState::Editing {
                step: FormStep::FIRST
            }
        );

        let per_session = open(&store, ConsentPolicy::PerSession).await;
        assert!(!per_session.controller().is_consented());
    }

    #[tokio::test]
    async fn declining_clears_store_and_records_nothing() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &complete_draft(), FormStep::Goals).await;
        let mut session = open(&store, ConsentPolicy::Remember).await;
        let state = session.decide_consent(ConsentDecision::Disagree).await.unwrap();
        assert_eq!(state, WizardState::Declined);
        assert!(store.is_empty());
        assert_matches!(
            session.advance().await,
            Err(SessionError::Wizard(WizardError::Declined))
        );
    }

    #[tokio::test]
    async fn invalid_advance_keeps_step_and_reports_fields() {
        let store = Arc::new(MemoryStore::new());
        let mut session = open(&store, ConsentPolicy::PerSession).await;
        session.decide_consent(ConsentDecision::Agree).await.unwrap();
        let err = session.advance().await.unwrap_err();
        assert_matches!(err, SessionError::Wizard(WizardError::Invalid(ref f)) if f.get("personal_info.name").is_some());
        assert_eq!(session.controller().current_step(), Some(FormStep::FIRST));
    }

    #[tokio::test]
    async fn advance_and_retreat_persist_step() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &complete_draft(), FormStep::Goals).await;
        let mut session = open(&store, ConsentPolicy::PerSession).await;
        session.decide_consent(ConsentDecision::Agree).await.unwrap();

        assert_eq!(session.advance().await.unwrap(), FormStep::Education);
        assert_eq!(store.get(STEP).await.unwrap().as_deref(), Some("3"));
        assert_eq!(session.retreat().await.unwrap(), FormStep::Goals);
        assert_eq!(store.get(STEP).await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn successful_submit_clears_store() {
        let store = Arc::new(MemoryStore::new());
        let mut session = ready_to_submit(&store).await;

        let fakes = Fakes::linked(42);
        let receipt = session
            .submit(
                Attachment::new(png(8, 8, true), "image/png"),
                &identity(),
                &assembler(&fakes),
            )
            .await
            .unwrap();
        assert_eq!(receipt.application_id, 501);
        assert_eq!(session.state(), WizardState::Completed);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_submit_keeps_draft_and_returns_to_confirmation() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, &complete_draft(), FormStep::Confirmation).await;
        let mut session = open(&store, ConsentPolicy::PerSession).await;
        session.decide_consent(ConsentDecision::Agree).await.unwrap();

        let fakes = Fakes::linked(42);
        // The rehydrated draft has no photo.
        let err = session
            .submit(
                Attachment::new(png(8, 8, true), "image/png"),
                &identity(),
                &assembler(&fakes),
            )
            .await
            .unwrap_err();
        assert_matches!(err, SessionError::Submission(SubmissionError::PhotoRequired));
        assert_eq!(
            session.state(),
            WizardState::Editing {
                step: FormStep::Confirmation
            }
        );
        assert!(store.get(DRAFT).await.unwrap().is_some());
        assert!(fakes.calls().is_empty());
    }

    #[tokio::test]
    async fn detached_submit_returns_guard_and_runs_hook() {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedSession = Arc::new(Mutex::new(ready_to_submit(&store).await));
        let fakes = Fakes::linked(42);
        let hooked = Arc::new(AtomicBool::new(false));
        let flag = hooked.clone();

        let (session, receipt) = submit_detached(
            shared.clone().lock_owned().await,
            Attachment::new(png(8, 8, true), "image/png"),
            identity(),
            assembler(&fakes),
            move |session, _| flag.store(session.state() == WizardState::Completed, Ordering::SeqCst),
        )
        .await
        .unwrap();

        assert_eq!(receipt.application_id, 501);
        assert_eq!(session.state(), WizardState::Completed);
        assert!(hooked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn abandoned_submit_still_settles() {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedSession = Arc::new(Mutex::new(ready_to_submit(&store).await));
        let fakes = Arc::new(Fakes {
            applicant: Some(42),
            lookup_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let hooked = Arc::new(AtomicBool::new(false));
        let flag = hooked.clone();

        let waited = tokio::time::timeout(
            Duration::from_millis(20),
            submit_detached(
                shared.clone().lock_owned().await,
                Attachment::new(png(8, 8, true), "image/png"),
                identity(),
                assembler(&fakes),
                move |_, _| flag.store(true, Ordering::SeqCst),
            ),
        )
        .await;
        assert!(waited.is_err());

        // The lock frees up once the submission has finished on its task.
        let session = shared.lock().await;
        assert_eq!(session.state(), WizardState::Completed);
        assert!(store.is_empty());
        assert!(hooked.load(Ordering::SeqCst));
        assert_eq!(fakes.calls().len(), 4);
    }

    #[tokio::test]
    async fn abandoned_failing_submit_returns_to_confirmation() {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedSession = Arc::new(Mutex::new(ready_to_submit(&store).await));
        let fakes = Arc::new(Fakes {
            applicant: Some(42),
            fail_insert: true,
            lookup_delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });

        let waited = tokio::time::timeout(
            Duration::from_millis(20),
            submit_detached(
                shared.clone().lock_owned().await,
                Attachment::new(png(8, 8, true), "image/png"),
                identity(),
                assembler(&fakes),
                |_, _| {},
            ),
        )
        .await;
        assert!(waited.is_err());

        let mut session = shared.lock().await;
        assert_eq!(
            session.state(),
            WizardState::Editing {
                step: FormStep::Confirmation
            }
        );
        assert_eq!(session.retreat().await.unwrap(), FormStep::SelfAssessment);
    }
}
