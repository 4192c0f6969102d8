//! Consent gate for the application form.
//!
//! No field editor is reachable until the applicant agrees to the data
//! privacy notice. Declining ends the flow. Whether an agreement is
//! remembered across sessions is a deployment choice ([`ConsentPolicy`]).

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Notice shown by the consent interstitial.
pub const CONSENT_NOTICE: &str = "By proceeding, you consent to the collection and processing of \
the personal information in this application for the purpose of evaluating your admission. \
Your data is stored securely and is only accessible to authorised admissions staff.";

/// How an agreement carries over to later sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentPolicy {
    /// Every freshly opened session starts gated.
    #[default]
    PerSession,
    /// An agreement is stored with the draft and skips the gate next time.
    Remember,
}

impl ConsentPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerSession => "per_session",
            Self::Remember => "remember",
        }
    }

    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "per_session" => Ok(Self::PerSession),
            "remember" => Ok(Self::Remember),
            other => Err(CoreError::Validation(format!(
                "Unknown consent policy '{other}'. Must be 'per_session' or 'remember'"
            ))),
        }
    }

    /// Whether a session should open without the interstitial.
    pub fn skips_gate(self, remembered: bool) -> bool {
        self == Self::Remember && remembered
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
    Agree,
    Disagree,
}

impl From<bool> for ConsentDecision {
    fn from(agree: bool) -> Self {
        if agree {
            Self::Agree
        } else {
            Self::Disagree
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_known_values() {
        assert_eq!(ConsentPolicy::parse("per_session").unwrap(), ConsentPolicy::PerSession);
        assert_eq!(ConsentPolicy::parse(" Remember ").unwrap(), ConsentPolicy::Remember);
        assert!(ConsentPolicy::parse("always").is_err());
        assert_eq!(ConsentPolicy::default(), ConsentPolicy::PerSession);
    }

    #[test]
    fn only_remember_policy_skips_gate() {
        assert!(!ConsentPolicy::PerSession.skips_gate(true));
        assert!(!ConsentPolicy::Remember.skips_gate(false));
        assert!(ConsentPolicy::Remember.skips_gate(true));
    }

    #[test]
    fn decision_from_bool() {
        assert_eq!(ConsentDecision::from(true), ConsentDecision::Agree);
        assert_eq!(ConsentDecision::from(false), ConsentDecision::Disagree);
    }
}
