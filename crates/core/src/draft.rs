//! The in-progress application draft and its per-slice reducers.
//!
//! [`ApplicationDraft`] is the single mutable aggregate behind one intake
//! session. Every nested collection is a typed record rather than loose JSON,
//! and every mutation goes through [`ApplicationDraft::apply`] (whole-slice
//! replacement) or the entry-list helpers, so the shape always stays a
//! superset of [`ApplicationDraft::default`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Repeatable entries
// ---------------------------------------------------------------------------

/// A record inside one of the draft's repeatable collections.
///
/// Each entry type names a primary field. A blank entry (every field empty)
/// is tolerated anywhere; a partially filled entry must carry its primary
/// field before the owning step can be left.
pub trait Entry: Default {
    /// JSON name of the primary field.
    const PRIMARY_FIELD: &'static str;
    /// Human-readable label of the primary field.
    const PRIMARY_LABEL: &'static str;

    fn primary(&self) -> &str;

    /// True when every field is empty or whitespace.
    fn is_blank(&self) -> bool;
}

macro_rules! entry_record {
    (
        $(#[$meta:meta])*
        $name:ident {
            primary: $primary:ident => $label:literal,
            $($field:ident),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            pub $primary: String,
            $(pub $field: String,)*
        }

        impl Entry for $name {
            const PRIMARY_FIELD: &'static str = stringify!($primary);
            const PRIMARY_LABEL: &'static str = $label;

            fn primary(&self) -> &str {
                &self.$primary
            }

            fn is_blank(&self) -> bool {
                self.$primary.trim().is_empty() $(&& self.$field.trim().is_empty())*
            }
        }
    };
}

entry_record! {
    /// One school attended at a given education level.
    SchoolEntry {
        primary: school_name => "School name",
        address,
        degree,
        date_from,
        date_to,
    }
}

entry_record! {
    /// A non-formal training, seminar or workshop.
    TrainingEntry {
        primary: title => "Training title",
        sponsor,
        venue,
        date_from,
        date_to,
    }
}

entry_record! {
    /// A certification or licensure examination passed.
    Certification {
        primary: title => "Certification title",
        agency,
        date_certified,
        rating,
    }
}

entry_record! {
    Publication {
        primary: title => "Publication title",
        circulation,
        date_published,
    }
}

entry_record! {
    Invention {
        primary: title => "Invention title",
        agency,
        date_issued,
    }
}

entry_record! {
    /// A position held under employment, consultancy or self-employment.
    WorkEntry {
        primary: company => "Company or organisation",
        position,
        address,
        date_from,
        date_to,
        duties,
    }
}

entry_record! {
    Recognition {
        primary: title => "Award title",
        awarding_body,
        date_awarded,
    }
}

entry_record! {
    /// A membership, project or research activity.
    ActivityEntry {
        primary: title => "Activity title",
        organization,
        role,
        date_from,
        date_to,
    }
}

entry_record! {
    CreativeWork {
        primary: title => "Title",
        institution,
        date_from,
        date_to,
    }
}

// ---------------------------------------------------------------------------
// Slices
// ---------------------------------------------------------------------------

/// Identity and contact block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub name: String,
    pub degree_program: String,
    pub campus: String,
    /// `YYYY-MM-DD`.
    pub application_date: String,
    pub folder_link: String,
    pub address: String,
    pub mobile_number: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Goals {
    /// Ordered degree-program choices; the first entry always exists.
    pub degree_choices: Vec<String>,
    pub statement: String,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            degree_choices: vec![String::new()],
            statement: String::new(),
        }
    }
}

/// Formal education history, by level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub tertiary: Vec<SchoolEntry>,
    pub secondary: Vec<SchoolEntry>,
    pub elementary: Vec<SchoolEntry>,
    pub technical: Vec<SchoolEntry>,
}

impl Default for Education {
    fn default() -> Self {
        Self {
            tertiary: vec![SchoolEntry::default()],
            secondary: vec![SchoolEntry::default()],
            elementary: vec![SchoolEntry::default()],
            technical: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub employment: Vec<WorkEntry>,
    pub consultancy: Vec<WorkEntry>,
    pub self_employment: Vec<WorkEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfessionalDevelopment {
    pub memberships: Vec<ActivityEntry>,
    pub projects: Vec<ActivityEntry>,
    pub research: Vec<ActivityEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifelongLearning {
    pub hobbies: String,
    pub special_skills: String,
    pub work_related_activities: String,
    pub volunteer_activities: String,
    pub travels: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelfAssessment {
    pub job_improvement: String,
    pub goals_achievement: String,
    pub personal_growth: String,
    pub contribution: String,
    pub future_plans: String,
}

// ---------------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------------

/// An in-memory binary upload (photo or signature).
///
/// Never serialized: attachments live only as long as the owning session.
#[derive(Clone, PartialEq, Eq)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: Option<String>,
}

impl Attachment {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension matching the content type, used for object paths.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            _ => "bin",
        }
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ApplicationDraft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    pub personal_info: PersonalInfo,
    pub goals: Goals,
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
    #[serde(skip)]
    pub photo: Option<Attachment>,
    #[serde(skip)]
    pub signature: Option<Attachment>,
}

impl Default for ApplicationDraft {
    fn default() -> Self {
        Self {
            personal_info: PersonalInfo::default(),
            goals: Goals::default(),
            education: Education::default(),
            non_formal_education: Vec::new(),
            certifications: Vec::new(),
            publications: Vec::new(),
            inventions: Vec::new(),
            work_experience: WorkExperience::default(),
            recognitions: Vec::new(),
            professional_development: ProfessionalDevelopment::default(),
            creative_works: Vec::new(),
            lifelong_learning: LifelongLearning::default(),
            self_assessment: SelfAssessment::default(),
            photo: None,
            signature: None,
        }
    }
}

impl ApplicationDraft {
    /// The canonical default shape as JSON, used for reconciliation.
    pub fn canonical_json() -> serde_json::Value {
        serde_json::to_value(Self::default()).unwrap_or(serde_json::Value::Null)
    }

    /// Replace one slice. Total over [`DraftPatch`] and free of side effects
    /// beyond the targeted slice.
    pub fn apply(&mut self, patch: DraftPatch) {
        match patch {
            DraftPatch::PersonalInfo(v) => self.personal_info = v,
            DraftPatch::Goals(v) => self.goals = v,
            DraftPatch::Education(v) => self.education = v,
            DraftPatch::NonFormalEducation(v) => self.non_formal_education = v,
            DraftPatch::Certifications(v) => self.certifications = v,
            DraftPatch::Publications(v) => self.publications = v,
            DraftPatch::Inventions(v) => self.inventions = v,
            DraftPatch::WorkExperience(v) => self.work_experience = v,
            DraftPatch::Recognitions(v) => self.recognitions = v,
            DraftPatch::ProfessionalDevelopment(v) => self.professional_development = v,
            DraftPatch::CreativeWorks(v) => self.creative_works = v,
            DraftPatch::LifelongLearning(v) => self.lifelong_learning = v,
            DraftPatch::SelfAssessment(v) => self.self_assessment = v,
        }
    }

    /// Append an empty entry to `list`.
    pub fn push_entry(&mut self, list: EntryList) {
        match list {
            EntryList::DegreeChoices => self.goals.degree_choices.push(String::new()),
            EntryList::Tertiary => self.education.tertiary.push(Default::default()),
            EntryList::Secondary => self.education.secondary.push(Default::default()),
            EntryList::Elementary => self.education.elementary.push(Default::default()),
            EntryList::Technical => self.education.technical.push(Default::default()),
            EntryList::NonFormalEducation => self.non_formal_education.push(Default::default()),
            EntryList::Certifications => self.certifications.push(Default::default()),
            EntryList::Publications => self.publications.push(Default::default()),
            EntryList::Inventions => self.inventions.push(Default::default()),
            EntryList::Employment => self.work_experience.employment.push(Default::default()),
            EntryList::Consultancy => self.work_experience.consultancy.push(Default::default()),
            EntryList::SelfEmployment => {
                self.work_experience.self_employment.push(Default::default())
            }
            EntryList::Recognitions => self.recognitions.push(Default::default()),
            EntryList::Memberships => {
                self.professional_development.memberships.push(Default::default())
            }
            EntryList::Projects => self.professional_development.projects.push(Default::default()),
            EntryList::Research => self.professional_development.research.push(Default::default()),
            EntryList::CreativeWorks => self.creative_works.push(Default::default()),
        }
    }

    /// Remove the entry at `index` from `list`.
    ///
    /// The first entry of a required list can never be removed.
    pub fn remove_entry(&mut self, list: EntryList, index: usize) -> Result<(), CoreError> {
        if list.is_required() && index == 0 {
            return Err(CoreError::Validation(format!(
                "The first entry of '{}' is required and cannot be removed",
                list.as_str()
            )));
        }
        let removed = match list {
            EntryList::DegreeChoices => remove_at(&mut self.goals.degree_choices, index),
            EntryList::Tertiary => remove_at(&mut self.education.tertiary, index),
            EntryList::Secondary => remove_at(&mut self.education.secondary, index),
            EntryList::Elementary => remove_at(&mut self.education.elementary, index),
            EntryList::Technical => remove_at(&mut self.education.technical, index),
            EntryList::NonFormalEducation => remove_at(&mut self.non_formal_education, index),
            EntryList::Certifications => remove_at(&mut self.certifications, index),
            EntryList::Publications => remove_at(&mut self.publications, index),
            EntryList::Inventions => remove_at(&mut self.inventions, index),
            EntryList::Employment => remove_at(&mut self.work_experience.employment, index),
            EntryList::Consultancy => remove_at(&mut self.work_experience.consultancy, index),
            EntryList::SelfEmployment => {
                remove_at(&mut self.work_experience.self_employment, index)
            }
            EntryList::Recognitions => remove_at(&mut self.recognitions, index),
            EntryList::Memberships => {
                remove_at(&mut self.professional_development.memberships, index)
            }
            EntryList::Projects => remove_at(&mut self.professional_development.projects, index),
            EntryList::Research => remove_at(&mut self.professional_development.research, index),
            EntryList::CreativeWorks => remove_at(&mut self.creative_works, index),
        };
        if removed {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "No entry at index {index} in '{}'",
                list.as_str()
            )))
        }
    }

    /// Number of entries currently in `list`.
    pub fn entry_count(&self, list: EntryList) -> usize {
        match list {
            EntryList::DegreeChoices => self.goals.degree_choices.len(),
            EntryList::Tertiary => self.education.tertiary.len(),
            EntryList::Secondary => self.education.secondary.len(),
            EntryList::Elementary => self.education.elementary.len(),
            EntryList::Technical => self.education.technical.len(),
            EntryList::NonFormalEducation => self.non_formal_education.len(),
            EntryList::Certifications => self.certifications.len(),
            EntryList::Publications => self.publications.len(),
            EntryList::Inventions => self.inventions.len(),
            EntryList::Employment => self.work_experience.employment.len(),
            EntryList::Consultancy => self.work_experience.consultancy.len(),
            EntryList::SelfEmployment => self.work_experience.self_employment.len(),
            EntryList::Recognitions => self.recognitions.len(),
            EntryList::Memberships => self.professional_development.memberships.len(),
            EntryList::Projects => self.professional_development.projects.len(),
            EntryList::Research => self.professional_development.research.len(),
            EntryList::CreativeWorks => self.creative_works.len(),
        }
    }
}

fn remove_at<T>(items: &mut Vec<T>, index: usize) -> bool {
    if index < items.len() {
        items.remove(index);
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// Slice names and patches
// ---------------------------------------------------------------------------

/// Top-level slices of the draft, one per field editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftSlice {
    PersonalInfo,
    Goals,
    Education,
    NonFormalEducation,
    Certifications,
    Publications,
    Inventions,
    WorkExperience,
    Recognitions,
    ProfessionalDevelopment,
    CreativeWorks,
    LifelongLearning,
    SelfAssessment,
}

impl DraftSlice {
    pub const ALL: [DraftSlice; 13] = [
        Self::PersonalInfo,
        Self::Goals,
        Self::Education,
        Self::NonFormalEducation,
        Self::Certifications,
        Self::Publications,
        Self::Inventions,
        Self::WorkExperience,
        Self::Recognitions,
        Self::ProfessionalDevelopment,
        Self::CreativeWorks,
        Self::LifelongLearning,
        Self::SelfAssessment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::PersonalInfo => "personal_info",
            Self::Goals => "goals",
            Self::Education => "education",
            Self::NonFormalEducation => "non_formal_education",
            Self::Certifications => "certifications",
            Self::Publications => "publications",
            Self::Inventions => "inventions",
            Self::WorkExperience => "work_experience",
            Self::Recognitions => "recognitions",
            Self::ProfessionalDevelopment => "professional_development",
            Self::CreativeWorks => "creative_works",
            Self::LifelongLearning => "lifelong_learning",
            Self::SelfAssessment => "self_assessment",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str() == name)
            .ok_or_else(|| CoreError::NotFoundByKey {
                entity: "DraftSlice",
                key: name.to_string(),
            })
    }
}

/// A whole-slice replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "slice", content = "value", rename_all = "snake_case")]
pub enum DraftPatch {
    PersonalInfo(PersonalInfo),
    Goals(Goals),
    Education(Education),
    NonFormalEducation(Vec<TrainingEntry>),
    Certifications(Vec<Certification>),
    Publications(Vec<Publication>),
    Inventions(Vec<Invention>),
    WorkExperience(WorkExperience),
    Recognitions(Vec<Recognition>),
    ProfessionalDevelopment(ProfessionalDevelopment),
    CreativeWorks(Vec<CreativeWork>),
    LifelongLearning(LifelongLearning),
    SelfAssessment(SelfAssessment),
}

impl DraftPatch {
    /// Build a patch for `slice` from an untyped JSON value.
    ///
    /// Values that do not match the slice's schema are rejected here so a
    /// malformed entry never enters the draft.
    pub fn from_json(slice: DraftSlice, value: serde_json::Value) -> Result<Self, CoreError> {
        let tagged = serde_json::json!({ "slice": slice.as_str(), "value": value });
        serde_json::from_value(tagged).map_err(|e| {
            CoreError::Validation(format!("Invalid data for '{}': {e}", slice.as_str()))
        })
    }

    pub fn slice(&self) -> DraftSlice {
        match self {
            Self::PersonalInfo(_) => DraftSlice::PersonalInfo,
            Self::Goals(_) => DraftSlice::Goals,
            Self::Education(_) => DraftSlice::Education,
            Self::NonFormalEducation(_) => DraftSlice::NonFormalEducation,
            Self::Certifications(_) => DraftSlice::Certifications,
            Self::Publications(_) => DraftSlice::Publications,
            Self::Inventions(_) => DraftSlice::Inventions,
            Self::WorkExperience(_) => DraftSlice::WorkExperience,
            Self::Recognitions(_) => DraftSlice::Recognitions,
            Self::ProfessionalDevelopment(_) => DraftSlice::ProfessionalDevelopment,
            Self::CreativeWorks(_) => DraftSlice::CreativeWorks,
            Self::LifelongLearning(_) => DraftSlice::LifelongLearning,
            Self::SelfAssessment(_) => DraftSlice::SelfAssessment,
        }
    }
}

/// Every repeatable collection in the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryList {
    DegreeChoices,
    Tertiary,
    Secondary,
    Elementary,
    Technical,
    NonFormalEducation,
    Certifications,
    Publications,
    Inventions,
    Employment,
    Consultancy,
    SelfEmployment,
    Recognitions,
    Memberships,
    Projects,
    Research,
    CreativeWorks,
}

impl EntryList {
    pub const ALL: [EntryList; 17] = [
        Self::DegreeChoices,
        Self::Tertiary,
        Self::Secondary,
        Self::Elementary,
        Self::Technical,
        Self::NonFormalEducation,
        Self::Certifications,
        Self::Publications,
        Self::Inventions,
        Self::Employment,
        Self::Consultancy,
        Self::SelfEmployment,
        Self::Recognitions,
        Self::Memberships,
        Self::Projects,
        Self::Research,
        Self::CreativeWorks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DegreeChoices => "degree_choices",
            Self::Tertiary => "tertiary",
            Self::Secondary => "secondary",
            Self::Elementary => "elementary",
            Self::Technical => "technical",
            Self::NonFormalEducation => "non_formal_education",
            Self::Certifications => "certifications",
            Self::Publications => "publications",
            Self::Inventions => "inventions",
            Self::Employment => "employment",
            Self::Consultancy => "consultancy",
            Self::SelfEmployment => "self_employment",
            Self::Recognitions => "recognitions",
            Self::Memberships => "memberships",
            Self::Projects => "projects",
            Self::Research => "research",
            Self::CreativeWorks => "creative_works",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|l| l.as_str() == name)
            .ok_or_else(|| CoreError::NotFoundByKey {
                entity: "EntryList",
                key: name.to_string(),
            })
    }

    /// Required lists always keep their first slot.
    pub fn is_required(self) -> bool {
        matches!(
            self,
            Self::DegreeChoices | Self::Tertiary | Self::Secondary | Self::Elementary
        )
    }

    /// The slice that owns this list.
    pub fn slice(self) -> DraftSlice {
        match self {
            Self::DegreeChoices => DraftSlice::Goals,
            Self::Tertiary | Self::Secondary | Self::Elementary | Self::Technical => {
                DraftSlice::Education
            }
            Self::NonFormalEducation => DraftSlice::NonFormalEducation,
            Self::Certifications => DraftSlice::Certifications,
            Self::Publications => DraftSlice::Publications,
            Self::Inventions => DraftSlice::Inventions,
            Self::Employment | Self::Consultancy | Self::SelfEmployment => {
                DraftSlice::WorkExperience
            }
            Self::Recognitions => DraftSlice::Recognitions,
            Self::Memberships | Self::Projects | Self::Research => {
                DraftSlice::ProfessionalDevelopment
            }
            Self::CreativeWorks => DraftSlice::CreativeWorks,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[test]
    fn default_prepopulates_required_lists() {
        let draft = ApplicationDraft::default();
        assert_eq!(draft.goals.degree_choices, vec![String::new()]);
        assert_eq!(draft.education.tertiary.len(), 1);
        assert_eq!(draft.education.secondary.len(), 1);
        assert_eq!(draft.education.elementary.len(), 1);
        assert!(draft.education.technical.is_empty());
        assert!(draft.photo.is_none());
    }

    #[test]
    fn canonical_json_has_every_slice() {
        let canonical = ApplicationDraft::canonical_json();
        let obj = canonical.as_object().unwrap();
        for slice in DraftSlice::ALL {
            assert!(obj.contains_key(slice.as_str()), "missing {}", slice.as_str());
        }
        assert!(!obj.contains_key("photo"));
        assert!(!obj.contains_key("signature"));
    }

    #[test]
    fn apply_replaces_only_the_target_slice() {
        let mut draft = ApplicationDraft::default();
        let before = draft.clone();
        draft.apply(DraftPatch::LifelongLearning(LifelongLearning {
            hobbies: "Chess".into(),
            ..Default::default()
        }));
        assert_eq!(draft.lifelong_learning.hobbies, "Chess");
        assert_eq!(draft.goals, before.goals);
        assert_eq!(draft.education, before.education);
    }

    #[test]
    fn patch_from_json_parses_typed_slice() {
        let patch = DraftPatch::from_json(
            DraftSlice::Goals,
            json!({ "degree_choices": ["BS Computer Science"], "statement": "Finish a degree" }),
        )
        .unwrap();
        assert_matches!(patch, DraftPatch::Goals(ref g) if g.degree_choices.len() == 1);
        assert_eq!(patch.slice(), DraftSlice::Goals);
    }

    #[test]
    fn patch_from_json_rejects_wrong_shape() {
        let result = DraftPatch::from_json(DraftSlice::Goals, json!({ "degree_choices": 5 }));
        assert_matches!(result, Err(CoreError::Validation(_)));
    }

    #[test]
    fn patch_from_json_fills_missing_fields_with_defaults() {
        let patch =
            DraftPatch::from_json(DraftSlice::CreativeWorks, json!([{ "title": "Mural" }])).unwrap();
        let DraftPatch::CreativeWorks(works) = patch else {
            panic!("expected creative works patch");
        };
        assert_eq!(works[0].title, "Mural");
        assert_eq!(works[0].institution, "");
    }

    #[test]
    fn slice_and_list_names_roundtrip() {
        for slice in DraftSlice::ALL {
            assert_eq!(DraftSlice::from_name(slice.as_str()).unwrap(), slice);
        }
        for list in EntryList::ALL {
            assert_eq!(EntryList::from_name(list.as_str()).unwrap(), list);
        }
        assert!(DraftSlice::from_name("photo").is_err());
        assert!(EntryList::from_name("nope").is_err());
    }

    #[test]
    fn push_then_remove_optional_entry() {
        let mut draft = ApplicationDraft::default();
        draft.push_entry(EntryList::Employment);
        draft.push_entry(EntryList::Employment);
        assert_eq!(draft.entry_count(EntryList::Employment), 2);
        draft.remove_entry(EntryList::Employment, 0).unwrap();
        assert_eq!(draft.entry_count(EntryList::Employment), 1);
    }

    #[test]
    fn first_required_entry_cannot_be_removed() {
        let mut draft = ApplicationDraft::default();
        assert!(draft.remove_entry(EntryList::DegreeChoices, 0).is_err());
        assert!(draft.remove_entry(EntryList::Tertiary, 0).is_err());

        draft.push_entry(EntryList::DegreeChoices);
        draft.remove_entry(EntryList::DegreeChoices, 1).unwrap();
        assert_eq!(draft.goals.degree_choices.len(), 1);
    }

    #[test]
    fn remove_out_of_range_is_rejected() {
        let mut draft = ApplicationDraft::default();
        assert_matches!(
            draft.remove_entry(EntryList::Publications, 0),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn entry_blank_detection() {
        let mut work = WorkEntry::default();
        assert!(work.is_blank());
        work.position = "Analyst".into();
        assert!(!work.is_blank());
        assert_eq!(work.primary(), "");
        assert_eq!(WorkEntry::PRIMARY_FIELD, "company");
    }

    #[test]
    fn attachments_are_never_serialized() {
        let mut draft = ApplicationDraft::default();
        draft.photo = Some(Attachment::new(vec![1, 2, 3], "image/png"));
        let value = serde_json::to_value(&draft).unwrap();
        assert!(value.get("photo").is_none());
        let back: ApplicationDraft = serde_json::from_value(value).unwrap();
        assert!(back.photo.is_none());
    }

    #[test]
    fn attachment_debug_hides_bytes() {
        let a = Attachment::new(vec![0; 2048], "image/jpeg").with_file_name("me.jpg");
        let debug = format!("{a:?}");
        assert!(debug.contains("len: 2048"));
        assert_eq!(a.extension(), "jpg");
    }
}
