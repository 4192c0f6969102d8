//! Step controller for the multi-step application form.
//!
//! The controller exclusively owns the [`ApplicationDraft`] for one intake
//! session and drives the state machine
//!
//! ```text
//! AwaitingConsent -> Editing(1..=9) -> Submitting -> Completed
//!        |                  ^               |
//!        v                  +---- failure --+
//!     Declined
//! ```
//!
//! Steps are 1-based. Advancing requires a [`StepClearance`] minted by the
//! step's field editor; retreating is unconditional. The terminal
//! [`FormStep::Success`] step is only reachable by a successful submission
//! and cannot be left.

use serde::{Deserialize, Serialize};

use crate::draft::{ApplicationDraft, Attachment, DraftPatch, DraftSlice, EntryList};
use crate::error::CoreError;
use crate::validation::{self, FieldErrors, StepClearance};

// ---------------------------------------------------------------------------
// Form steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    PersonalInformation,
    Goals,
    Education,
    WorkExperience,
    Achievements,
    CreativeWorks,
    LifelongLearning,
    SelfAssessment,
    Confirmation,
    Success,
}

/// Total number of steps, including the terminal success step.
pub const TOTAL_STEPS: u8 = 10;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (the terminal success step).
pub const MAX_STEP: u8 = 10;

impl FormStep {
    pub const ALL: [FormStep; 10] = [
        Self::PersonalInformation,
        Self::Goals,
        Self::Education,
        Self::WorkExperience,
        Self::Achievements,
        Self::CreativeWorks,
        Self::LifelongLearning,
        Self::SelfAssessment,
        Self::Confirmation,
        Self::Success,
    ];

    pub const FIRST: FormStep = Self::PersonalInformation;

    /// Convert a 1-based step number to a `FormStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        if !(MIN_STEP..=MAX_STEP).contains(&n) {
            return Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            )));
        }
        Ok(Self::ALL[usize::from(n - 1)])
    }

    /// Convert to a 1-based step number.
    pub fn number(self) -> u8 {
        match self {
            Self::PersonalInformation => 1,
            Self::Goals => 2,
            Self::Education => 3,
            Self::WorkExperience => 4,
            Self::Achievements => 5,
            Self::CreativeWorks => 6,
            Self::LifelongLearning => 7,
            Self::SelfAssessment => 8,
            Self::Confirmation => 9,
            Self::Success => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PersonalInformation => "Personal Information",
            Self::Goals => "Goals",
            Self::Education => "Education",
            Self::WorkExperience => "Work Experience",
            Self::Achievements => "Achievements",
            Self::CreativeWorks => "Creative Works",
            Self::LifelongLearning => "Lifelong Learning",
            Self::SelfAssessment => "Self Assessment",
            Self::Confirmation => "Confirmation",
            Self::Success => "Success",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1).ok()
    }

    pub fn previous(self) -> Option<Self> {
        Self::from_number(self.number().checked_sub(1)?).ok()
    }

    /// Draft slices whose editor is mounted on this step.
    pub fn slices(self) -> &'static [DraftSlice] {
        match self {
            Self::PersonalInformation => &[DraftSlice::PersonalInfo],
            Self::Goals => &[DraftSlice::Goals],
            Self::Education => &[
                DraftSlice::Education,
                DraftSlice::NonFormalEducation,
                DraftSlice::Certifications,
            ],
            Self::WorkExperience => &[DraftSlice::WorkExperience],
            Self::Achievements => &[
                DraftSlice::Publications,
                DraftSlice::Inventions,
                DraftSlice::Recognitions,
                DraftSlice::ProfessionalDevelopment,
            ],
            Self::CreativeWorks => &[DraftSlice::CreativeWorks],
            Self::LifelongLearning => &[DraftSlice::LifelongLearning],
            Self::SelfAssessment => &[DraftSlice::SelfAssessment],
            Self::Confirmation | Self::Success => &[],
        }
    }

    pub fn owns(self, slice: DraftSlice) -> bool {
        self.slices().contains(&slice)
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    /// Consent interstitial; `resume_step` is where editing will start.
    AwaitingConsent { resume_step: FormStep },
    Editing { step: FormStep },
    Submitting,
    Completed,
    Declined,
}

impl WizardState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingConsent { .. } => "awaiting_consent",
            Self::Editing { .. } => "editing",
            Self::Submitting => "submitting",
            Self::Completed => "completed",
            Self::Declined => "declined",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Consent must be given before the application form can be used")]
    ConsentRequired,

    #[error("Consent has already been decided for this session")]
    ConsentAlreadyDecided,

    #[error("The application flow was declined")]
    Declined,

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("The application has already been submitted")]
    AlreadySubmitted,

    #[error("Cannot go back from the first step")]
    AtFirstStep,

    #[error("The confirmation step is submitted, not advanced")]
    SubmitRequired,

    #[error("Submission is only possible from the confirmation step")]
    NotOnConfirmation,

    #[error("Step clearance for {issued:?} does not match the current step {current:?}")]
    StaleClearance { issued: FormStep, current: FormStep },

    #[error("'{slice}' is not edited on the {step} step")]
    SliceNotOnStep { slice: &'static str, step: &'static str },

    #[error("{0}")]
    Invalid(FieldErrors),

    #[error(transparent)]
    Edit(#[from] CoreError),
}

/// Owns one draft and the position of the form.
#[derive(Debug, Clone)]
pub struct StepController {
    draft: ApplicationDraft,
    state: WizardState,
}

impl StepController {
    /// A fresh, gated controller with the canonical default draft.
    pub fn new() -> Self {
        Self::resume(ApplicationDraft::default(), FormStep::FIRST, false)
    }

    /// Rebuild a controller from a rehydrated draft.
    ///
    /// `consented` skips the consent interstitial (remembered consent).
    pub fn resume(draft: ApplicationDraft, step: FormStep, consented: bool) -> Self {
        // Success is never a resumable position.
        let step = if step == FormStep::Success {
            FormStep::Confirmation
        } else {
            step
        };
        let state = if consented {
            WizardState::Editing { step }
        } else {
            WizardState::AwaitingConsent { resume_step: step }
        };
        Self { draft, state }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// The step the form is showing, if the form is reachable at all.
    pub fn current_step(&self) -> Option<FormStep> {
        match self.state {
            WizardState::Editing { step } => Some(step),
            WizardState::Submitting => Some(FormStep::Confirmation),
            WizardState::Completed => Some(FormStep::Success),
            WizardState::AwaitingConsent { .. } | WizardState::Declined => None,
        }
    }

    pub fn is_consented(&self) -> bool {
        !matches!(
            self.state,
            WizardState::AwaitingConsent { .. } | WizardState::Declined
        )
    }

    // -- consent ------------------------------------------------------------

    pub fn agree(&mut self) -> Result<FormStep, WizardError> {
        match self.state {
            WizardState::AwaitingConsent { resume_step } => {
                self.state = WizardState::Editing { step: resume_step };
                Ok(resume_step)
            }
            WizardState::Declined => Err(WizardError::Declined),
            _ => Err(WizardError::ConsentAlreadyDecided),
        }
    }

    /// Terminal rejection; the draft is discarded.
    pub fn disagree(&mut self) -> Result<(), WizardError> {
        match self.state {
            WizardState::AwaitingConsent { .. } => {
                self.state = WizardState::Declined;
                self.draft = ApplicationDraft::default();
                Ok(())
            }
            WizardState::Declined => Err(WizardError::Declined),
            _ => Err(WizardError::ConsentAlreadyDecided),
        }
    }

    // -- editing ------------------------------------------------------------

    fn editing_step(&self) -> Result<FormStep, WizardError> {
        match self.state {
            WizardState::Editing { step } => Ok(step),
            WizardState::AwaitingConsent { .. } => Err(WizardError::ConsentRequired),
            WizardState::Submitting => Err(WizardError::SubmissionInProgress),
            WizardState::Completed => Err(WizardError::AlreadySubmitted),
            WizardState::Declined => Err(WizardError::Declined),
        }
    }

    fn ensure_mounted(&self, slice: DraftSlice) -> Result<(), WizardError> {
        let step = self.editing_step()?;
        if step.owns(slice) {
            Ok(())
        } else {
            Err(WizardError::SliceNotOnStep {
                slice: slice.as_str(),
                step: step.label(),
            })
        }
    }

    /// Replace one slice. Only the editors mounted on the current step may
    /// write.
    pub fn update(&mut self, patch: DraftPatch) -> Result<(), WizardError> {
        self.ensure_mounted(patch.slice())?;
        self.draft.apply(patch);
        Ok(())
    }

    pub fn push_entry(&mut self, list: EntryList) -> Result<(), WizardError> {
        self.ensure_mounted(list.slice())?;
        self.draft.push_entry(list);
        Ok(())
    }

    pub fn remove_entry(&mut self, list: EntryList, index: usize) -> Result<(), WizardError> {
        self.ensure_mounted(list.slice())?;
        self.draft.remove_entry(list, index)?;
        Ok(())
    }

    /// Attach or clear the photo (personal information step only).
    pub fn set_photo(&mut self, photo: Option<Attachment>) -> Result<(), WizardError> {
        self.ensure_mounted(DraftSlice::PersonalInfo)?;
        self.draft.photo = photo;
        Ok(())
    }

    // -- navigation ---------------------------------------------------------

    /// Move to the next step. Trusts the clearance; does not re-validate.
    pub fn advance(&mut self, clearance: StepClearance) -> Result<FormStep, WizardError> {
        let current = self.editing_step()?;
        if clearance.step() != current {
            return Err(WizardError::StaleClearance {
                issued: clearance.step(),
                current,
            });
        }
        if current == FormStep::Confirmation {
            return Err(WizardError::SubmitRequired);
        }
        let next = current.next().ok_or(WizardError::SubmitRequired)?;
        self.state = WizardState::Editing { step: next };
        Ok(next)
    }

    /// Run the mounted editor's validation, then advance.
    ///
    /// On validation failure the step is unchanged and the inline messages
    /// are returned in [`WizardError::Invalid`].
    pub fn validate_and_proceed(&mut self) -> Result<FormStep, WizardError> {
        let current = self.editing_step()?;
        let clearance =
            validation::clear_step(current, &self.draft).map_err(WizardError::Invalid)?;
        self.advance(clearance)
    }

    /// Go back one step. Never validates.
    pub fn retreat(&mut self) -> Result<FormStep, WizardError> {
        let current = self.editing_step()?;
        let prev = current.previous().ok_or(WizardError::AtFirstStep)?;
        self.state = WizardState::Editing { step: prev };
        Ok(prev)
    }

    // -- submission ---------------------------------------------------------

    /// Capture the signature and lock the draft for submission.
    pub fn begin_submit(&mut self, signature: Attachment) -> Result<(), WizardError> {
        if self.editing_step()? != FormStep::Confirmation {
            return Err(WizardError::NotOnConfirmation);
        }
        self.draft.signature = Some(signature);
        self.state = WizardState::Submitting;
        Ok(())
    }

    /// Settle an in-flight submission: success is terminal, failure returns
    /// to the confirmation step with the draft intact.
    pub fn finish_submit(&mut self, succeeded: bool) {
        if self.state != WizardState::Submitting {
            return;
        }
        if succeeded {
            self.state = WizardState::Completed;
        } else {
            self.draft.signature = None;
            self.state = WizardState::Editing {
                step: FormStep::Confirmation,
            };
        }
    }
}

impl Default for StepController {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Goals, PersonalInfo};
    use crate::validation::tests::{complete_draft, png};
    use assert_matches::assert_matches;

    fn editing_at(step: FormStep, draft: ApplicationDraft) -> StepController {
        StepController::resume(draft, step, true)
    }

    #[test]
    fn step_numbers_roundtrip() {
        for n in MIN_STEP..=MAX_STEP {
            assert_eq!(FormStep::from_number(n).unwrap().number(), n);
        }
        assert!(FormStep::from_number(0).is_err());
        assert!(FormStep::from_number(11).is_err());
        assert_eq!(FormStep::ALL.len(), usize::from(TOTAL_STEPS));
    }

    #[test]
    fn step_neighbours() {
        assert_eq!(FormStep::FIRST.previous(), None);
        assert_eq!(FormStep::Goals.previous(), Some(FormStep::PersonalInformation));
        assert_eq!(FormStep::Confirmation.next(), Some(FormStep::Success));
        assert_eq!(FormStep::Success.next(), None);
    }

    #[test]
    fn every_slice_is_owned_by_exactly_one_step() {
        for slice in DraftSlice::ALL {
            let owners = FormStep::ALL.iter().filter(|s| s.owns(slice)).count();
            assert_eq!(owners, 1, "{slice:?}");
        }
    }

    #[test]
    fn new_controller_is_gated() {
        let mut c = StepController::new();
        assert_eq!(
            c.state(),
            WizardState::AwaitingConsent {
                resume_step: FormStep::FIRST
            }
        );
        assert_eq!(c.current_step(), None);
        assert_matches!(c.retreat(), Err(WizardError::ConsentRequired));
        assert_matches!(
            c.update(DraftPatch::Goals(Goals::default())),
            Err(WizardError::ConsentRequired)
        );
    }

    #[test]
    fn agree_resumes_saved_step() {
        let mut c = StepController::resume(ApplicationDraft::default(), FormStep::Education, false);
        assert_eq!(c.agree().unwrap(), FormStep::Education);
        assert_eq!(c.current_step(), Some(FormStep::Education));
        assert_matches!(c.agree(), Err(WizardError::ConsentAlreadyDecided));
    }

    #[test]
    fn disagree_is_terminal_and_discards_draft() {
        let mut draft = ApplicationDraft::default();
        draft.personal_info.name = "X".into();
        let mut c = StepController::resume(draft, FormStep::Goals, false);
        c.disagree().unwrap();
        assert_eq!(c.state(), WizardState::Declined);
        assert_eq!(c.draft(), &ApplicationDraft::default());
        assert_matches!(c.agree(), Err(WizardError::Declined));
        assert_matches!(c.validate_and_proceed(), Err(WizardError::Declined));
    }

    #[test]
    fn empty_goal_list_does_not_advance() {
        let mut draft = complete_draft();
        draft.goals.degree_choices.clear();
        let mut c = editing_at(FormStep::Goals, draft);
        assert_matches!(c.validate_and_proceed(), Err(WizardError::Invalid(_)));
        assert_eq!(c.current_step(), Some(FormStep::Goals));
    }

    #[test]
    fn valid_step_always_advances_by_one() {
        let draft = complete_draft();
        for step in &FormStep::ALL[..8] {
            let mut c = editing_at(*step, draft.clone());
            let next = c.validate_and_proceed().unwrap();
            assert_eq!(next.number(), step.number() + 1);
        }
    }

    #[test]
    fn clearance_for_another_step_is_refused() {
        let draft = complete_draft();
        let clearance = validation::clear_step(FormStep::Goals, &draft).unwrap();
        let mut c = editing_at(FormStep::PersonalInformation, draft);
        assert_matches!(c.advance(clearance), Err(WizardError::StaleClearance { .. }));
        assert_eq!(c.current_step(), Some(FormStep::PersonalInformation));
    }

    #[test]
    fn confirmation_requires_submit() {
        let mut c = editing_at(FormStep::Confirmation, complete_draft());
        assert_matches!(c.validate_and_proceed(), Err(WizardError::SubmitRequired));
    }

    #[test]
    fn retreat_never_validates() {
        // An empty draft fails every editor, yet retreat succeeds from every step > 1.
        for step in &FormStep::ALL[1..9] {
            let mut c = editing_at(*step, ApplicationDraft::default());
            let prev = c.retreat().unwrap();
            assert_eq!(prev.number(), step.number() - 1);
        }
        let mut first = editing_at(FormStep::FIRST, ApplicationDraft::default());
        assert_matches!(first.retreat(), Err(WizardError::AtFirstStep));
    }

    #[test]
    fn only_mounted_slices_are_writable() {
        let mut c = editing_at(FormStep::Goals, ApplicationDraft::default());
        assert_matches!(
            c.update(DraftPatch::PersonalInfo(PersonalInfo::default())),
            Err(WizardError::SliceNotOnStep { .. })
        );
        c.update(DraftPatch::Goals(Goals {
            degree_choices: vec!["BSIT".into()],
            statement: "s".into(),
        }))
        .unwrap();
        c.push_entry(EntryList::DegreeChoices).unwrap();
        assert_eq!(c.draft().goals.degree_choices.len(), 2);
        assert_matches!(
            c.remove_entry(EntryList::DegreeChoices, 0),
            Err(WizardError::Edit(_))
        );
        assert_matches!(
            c.set_photo(None),
            Err(WizardError::SliceNotOnStep { .. })
        );
    }

    #[test]
    fn submit_lifecycle_success_is_terminal() {
        let mut c = editing_at(FormStep::Confirmation, complete_draft());
        c.begin_submit(Attachment::new(png(2, 2, true), "image/png"))
            .unwrap();
        assert_eq!(c.state(), WizardState::Submitting);
        assert_matches!(
            c.begin_submit(Attachment::new(vec![1], "image/png")),
            Err(WizardError::SubmissionInProgress)
        );
        c.finish_submit(true);
        assert_eq!(c.state(), WizardState::Completed);
        assert_eq!(c.current_step(), Some(FormStep::Success));
        assert_matches!(c.retreat(), Err(WizardError::AlreadySubmitted));
    }

    #[test]
    fn failed_submit_returns_to_confirmation() {
        let mut c = editing_at(FormStep::Confirmation, complete_draft());
        c.begin_submit(Attachment::new(png(2, 2, true), "image/png"))
            .unwrap();
        c.finish_submit(false);
        assert_eq!(
            c.state(),
            WizardState::Editing {
                step: FormStep::Confirmation
            }
        );
        assert!(c.draft().signature.is_none());
        assert_eq!(c.draft().personal_info.name, "Maria Santos");
    }

    #[test]
    fn submit_outside_confirmation_is_refused() {
        let mut c = editing_at(FormStep::Goals, complete_draft());
        assert_matches!(
            c.begin_submit(Attachment::new(vec![1], "image/png")),
            Err(WizardError::NotOnConfirmation)
        );
    }

    #[test]
    fn resume_never_lands_on_success() {
        let c = StepController::resume(ApplicationDraft::default(), FormStep::Success, true);
        assert_eq!(c.current_step(), Some(FormStep::Confirmation));
    }
}
