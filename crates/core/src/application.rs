//! Review status of a submitted application.
//!
//! Transition rules:
//! - `pending`      -> `under_review`, `accepted`, `rejected`
//! - `under_review` -> `accepted`, `rejected`
//! - `accepted`     -> `under_review` (re-open)
//! - `rejected`     -> `under_review` (re-open)

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of reviewer remarks attached to a status change.
pub const MAX_REMARKS_LENGTH: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 4] = [
        Self::Pending,
        Self::UnderReview,
        Self::Accepted,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::UnderReview => "under_review",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid application status '{s}'. Must be one of: pending, under_review, accepted, rejected"
                ))
            })
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::UnderReview => "Under Review",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }

    pub fn valid_transitions(self) -> &'static [ApplicationStatus] {
        match self {
            Self::Pending => &[Self::UnderReview, Self::Accepted, Self::Rejected],
            Self::UnderReview => &[Self::Accepted, Self::Rejected],
            Self::Accepted | Self::Rejected => &[Self::UnderReview],
        }
    }

    pub fn validate_transition(self, next: ApplicationStatus) -> Result<(), CoreError> {
        if self.valid_transitions().contains(&next) {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Cannot move an application from '{}' to '{}'",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

pub fn validate_remarks(remarks: &str) -> Result<(), CoreError> {
    if remarks.chars().count() > MAX_REMARKS_LENGTH {
        return Err(CoreError::Validation(format!(
            "Remarks exceed maximum length of {MAX_REMARKS_LENGTH} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_strings_roundtrip() {
        for status in ApplicationStatus::ALL {
            assert_eq!(ApplicationStatus::from_str_db(status.as_str()).unwrap(), status);
        }
        assert!(ApplicationStatus::from_str_db("approved").is_err());
    }

    #[test]
    fn pending_moves_anywhere_forward() {
        let p = ApplicationStatus::Pending;
        assert!(p.validate_transition(ApplicationStatus::UnderReview).is_ok());
        assert!(p.validate_transition(ApplicationStatus::Accepted).is_ok());
        assert!(p.validate_transition(ApplicationStatus::Rejected).is_ok());
        assert!(p.validate_transition(ApplicationStatus::Pending).is_err());
    }

    #[test]
    fn final_statuses_only_reopen() {
        for status in [ApplicationStatus::Accepted, ApplicationStatus::Rejected] {
            assert!(status.is_final());
            assert!(status.validate_transition(ApplicationStatus::UnderReview).is_ok());
            assert!(status.validate_transition(ApplicationStatus::Pending).is_err());
            assert!(status.validate_transition(ApplicationStatus::Accepted).is_err());
        }
    }

    #[test]
    fn under_review_cannot_go_back_to_pending() {
        assert!(ApplicationStatus::UnderReview
            .validate_transition(ApplicationStatus::Pending)
            .is_err());
    }

    #[test]
    fn remarks_length_is_bounded() {
        assert!(validate_remarks("Looks complete.").is_ok());
        assert!(validate_remarks(&"x".repeat(MAX_REMARKS_LENGTH + 1)).is_err());
    }
}
