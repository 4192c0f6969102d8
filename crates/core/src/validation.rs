//! Field editors: per-step validation of the application draft.
//!
//! Each form step has one validator. A passing validator mints a
//! [`StepClearance`], the only value [`StepController::advance`] accepts,
//! so the controller never re-validates and can never advance past a step
//! whose editor did not approve it.
//!
//! [`StepController::advance`]: crate::wizard::StepController::advance

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::draft::{ApplicationDraft, Attachment, Entry};
use crate::wizard::FormStep;

pub const MOBILE_NUMBER_MESSAGE: &str = "Mobile number must be 11 digits.";
pub const EMAIL_MESSAGE: &str = "Please enter a valid email address.";
pub const DEGREE_CHOICE_MESSAGE: &str = "At least one degree program is required.";
pub const PHOTO_REQUIRED_MESSAGE: &str = "Photo is required.";

/// Date format used by every date field of the draft.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn mobile_pattern() -> &'static Regex {
    static MOBILE: OnceLock<Regex> = OnceLock::new();
    MOBILE.get_or_init(|| Regex::new(r"^[0-9]{11}$").expect("valid mobile regex"))
}

// ---------------------------------------------------------------------------
// FieldErrors
// ---------------------------------------------------------------------------

/// Inline validation messages keyed by field path (e.g. `personal_info.email`,
/// `education.tertiary[1].school_name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for `field`. The first message for a field wins.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.0.values().map(String::as_str).collect();
        write!(f, "{}", joined.join(" "))
    }
}

impl std::error::Error for FieldErrors {}

// ---------------------------------------------------------------------------
// StepClearance
// ---------------------------------------------------------------------------

/// Proof that the editor of `step` accepted the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepClearance {
    step: FormStep,
}

impl StepClearance {
    pub fn step(&self) -> FormStep {
        self.step
    }
}

/// Run the editor validation for `step` against `draft`.
pub fn clear_step(step: FormStep, draft: &ApplicationDraft) -> Result<StepClearance, FieldErrors> {
    let mut errors = FieldErrors::new();
    match step {
        FormStep::PersonalInformation => check_personal_information(draft, &mut errors),
        FormStep::Goals => check_goals(draft, &mut errors),
        FormStep::Education => check_education(draft, &mut errors),
        FormStep::WorkExperience => {
            let work = &draft.work_experience;
            check_entries(&mut errors, "work_experience.employment", &work.employment);
            check_entries(&mut errors, "work_experience.consultancy", &work.consultancy);
            check_entries(&mut errors, "work_experience.self_employment", &work.self_employment);
        }
        FormStep::Achievements => check_achievements(draft, &mut errors),
        FormStep::CreativeWorks => {
            check_entries(&mut errors, "creative_works", &draft.creative_works);
        }
        FormStep::LifelongLearning => {
            let l = &draft.lifelong_learning;
            let prefix = "lifelong_learning";
            require(&mut errors, prefix, "hobbies", "Hobbies", &l.hobbies);
            require(&mut errors, prefix, "special_skills", "Special skills", &l.special_skills);
            require(
                &mut errors,
                prefix,
                "work_related_activities",
                "Work-related activities",
                &l.work_related_activities,
            );
            require(
                &mut errors,
                prefix,
                "volunteer_activities",
                "Volunteer activities",
                &l.volunteer_activities,
            );
            require(&mut errors, prefix, "travels", "Travels", &l.travels);
        }
        FormStep::SelfAssessment => {
            let s = &draft.self_assessment;
            let prefix = "self_assessment";
            require(&mut errors, prefix, "job_improvement", "Job improvement", &s.job_improvement);
            require(
                &mut errors,
                prefix,
                "goals_achievement",
                "Goals achievement",
                &s.goals_achievement,
            );
            require(&mut errors, prefix, "personal_growth", "Personal growth", &s.personal_growth);
            require(&mut errors, prefix, "contribution", "Contribution", &s.contribution);
            require(&mut errors, prefix, "future_plans", "Future plans", &s.future_plans);
        }
        // The review step has nothing of its own to validate; the signature is
        // checked by the submission assembler.
        FormStep::Confirmation | FormStep::Success => {}
    }

    if errors.is_empty() {
        Ok(StepClearance { step })
    } else {
        Err(errors)
    }
}

fn check_personal_information(draft: &ApplicationDraft, errors: &mut FieldErrors) {
    let p = &draft.personal_info;
    let prefix = "personal_info";
    require(errors, prefix, "name", "Name", &p.name);
    require(errors, prefix, "degree_program", "Degree program", &p.degree_program);
    require(errors, prefix, "campus", "Campus", &p.campus);
    require(errors, prefix, "address", "Address", &p.address);

    if require(errors, prefix, "application_date", "Application date", &p.application_date)
        && chrono::NaiveDate::parse_from_str(p.application_date.trim(), DATE_FORMAT).is_err()
    {
        errors.add(
            "personal_info.application_date",
            "Application date must be a valid date (YYYY-MM-DD).",
        );
    }

    if require(errors, prefix, "mobile_number", "Mobile number", &p.mobile_number) {
        if let Some(msg) = validate_mobile_number(&p.mobile_number) {
            errors.add("personal_info.mobile_number", msg);
        }
    }

    if require(errors, prefix, "email", "Email", &p.email) {
        if let Some(msg) = validate_email(&p.email) {
            errors.add("personal_info.email", msg);
        }
    }

    let link = p.folder_link.trim();
    if !link.is_empty() && !(link.starts_with("https://") || link.starts_with("http://")) {
        errors.add("personal_info.folder_link", "Folder link must be a valid URL.");
    }

    match &draft.photo {
        None => errors.add("photo", PHOTO_REQUIRED_MESSAGE),
        Some(photo) if photo.is_empty() => errors.add("photo", PHOTO_REQUIRED_MESSAGE),
        Some(photo) => {
            if let Err(msg) = validate_photo(photo) {
                errors.add("photo", msg);
            }
        }
    }
}

fn check_goals(draft: &ApplicationDraft, errors: &mut FieldErrors) {
    let goals = &draft.goals;
    let has_first = goals
        .degree_choices
        .first()
        .is_some_and(|c| !c.trim().is_empty());
    if !has_first {
        errors.add("goals.degree_choices", DEGREE_CHOICE_MESSAGE);
    }
    require(errors, "goals", "statement", "Goal statement", &goals.statement);
}

fn check_education(draft: &ApplicationDraft, errors: &mut FieldErrors) {
    let edu = &draft.education;
    for (level, label, entries) in [
        ("tertiary", "Tertiary", &edu.tertiary),
        ("secondary", "Secondary", &edu.secondary),
        ("elementary", "Elementary", &edu.elementary),
    ] {
        let field = format!("education.{level}");
        match entries.first() {
            Some(first) if !first.school_name.trim().is_empty() => {
                check_entries(errors, &field, entries);
            }
            _ => errors.add(field, format!("{label} education is required.")),
        }
    }
    check_entries(errors, "education.technical", &edu.technical);
    check_entries(errors, "non_formal_education", &draft.non_formal_education);
    check_entries(errors, "certifications", &draft.certifications);
}

fn check_achievements(draft: &ApplicationDraft, errors: &mut FieldErrors) {
    check_entries(errors, "publications", &draft.publications);
    check_entries(errors, "inventions", &draft.inventions);
    check_entries(errors, "recognitions", &draft.recognitions);
    let pd = &draft.professional_development;
    check_entries(errors, "professional_development.memberships", &pd.memberships);
    check_entries(errors, "professional_development.projects", &pd.projects);
    check_entries(errors, "professional_development.research", &pd.research);
}

/// Adds a "<label> is required." message when `value` is blank.
/// Returns `true` when the value is present.
fn require(errors: &mut FieldErrors, prefix: &str, field: &str, label: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(format!("{prefix}.{field}"), format!("{label} is required."));
        false
    } else {
        true
    }
}

/// Partially filled entries must carry their primary field.
fn check_entries<E: Entry>(errors: &mut FieldErrors, path: &str, entries: &[E]) {
    for (i, entry) in entries.iter().enumerate() {
        if !entry.is_blank() && entry.primary().trim().is_empty() {
            errors.add(
                format!("{path}[{i}].{}", E::PRIMARY_FIELD),
                format!("{} is required.", E::PRIMARY_LABEL),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Field patterns
// ---------------------------------------------------------------------------

/// `None` when `value` is exactly 11 ASCII digits.
pub fn validate_mobile_number(value: &str) -> Option<&'static str> {
    if mobile_pattern().is_match(value.trim()) {
        None
    } else {
        Some(MOBILE_NUMBER_MESSAGE)
    }
}

pub fn validate_email(value: &str) -> Option<&'static str> {
    if email_pattern().is_match(value.trim()) {
        None
    } else {
        Some(EMAIL_MESSAGE)
    }
}

// ---------------------------------------------------------------------------
// Binary inspection
// ---------------------------------------------------------------------------

/// Accept PNG, JPEG and WebP photos whose header decodes to a non-zero size.
///
/// Returns the MIME type of the format found in the bytes. The declared
/// content type plays no part.
pub fn validate_photo(photo: &Attachment) -> Result<&'static str, String> {
    let reader = image::ImageReader::new(Cursor::new(&photo.bytes))
        .with_guessed_format()
        .map_err(|e| format!("Photo could not be read: {e}"))?;

    let mime = match reader.format() {
        Some(
            format @ (image::ImageFormat::Png | image::ImageFormat::Jpeg | image::ImageFormat::WebP),
        ) => format.to_mime_type(),
        _ => return Err("Photo must be a PNG, JPEG or WebP image.".to_string()),
    };

    let (w, h) = reader
        .into_dimensions()
        .map_err(|e| format!("Photo could not be read: {e}"))?;
    if w == 0 || h == 0 {
        return Err("Photo must not be empty.".to_string());
    }
    Ok(mime)
}

/// Whether a signature image has no drawn stroke.
///
/// A stroke is any pixel that is neither transparent nor (near-)white, which
/// covers both transparent and white-filled canvas exports.
pub fn signature_is_blank(bytes: &[u8]) -> Result<bool, String> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| format!("Signature image could not be decoded: {e}"))?
        .to_rgba8();
    let drawn = img
        .pixels()
        .any(|p| p[3] > 0 && (p[0] < 250 || p[1] < 250 || p[2] < 250));
    Ok(!drawn)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
