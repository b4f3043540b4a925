use crate::model::{LocalizedText, ValidityTimeFormat};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The outcome of validating a certificate for one profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ValidationResult {
    /// The certificate is valid for the profile within the reported time windows
    Valid(ValidProfileResult),

    /// The certificate is not valid; `violations` may be empty when a rule-set marks it invalid outright
    Invalid { violations: Vec<ConditionViolation> },

    /// A general condition could not be evaluated
    Error { failed_conditions: Vec<String> },
}

impl ValidationResult {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    #[must_use]
    pub const fn as_valid(&self) -> Option<&ValidProfileResult> {
        match self {
            Self::Valid(valid) => Some(valid),
            Self::Invalid { .. } | Self::Error { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidProfileResult {
    pub profile: String,
    pub region: String,

    /// Candidate start instants, earliest first
    pub valid_from: Vec<ValidityTimeResult>,

    /// Candidate end instants, latest first
    pub valid_until: Vec<ValidityTimeResult>,

    pub matching_linked_conditions: Vec<LinkedConditionResult>,
    pub violated_or_failed_linked_conditions: Vec<LinkedConditionResult>,
}

/// One resolved validity time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityTimeResult {
    pub time: DateTime<Utc>,
    pub format: ValidityTimeFormat,

    /// The AND-group that selected this candidate, if it was guarded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Vec<String>>,
}

/// A condition that evaluated to false
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionViolation {
    pub condition: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<LocalizedText>,
}

impl ConditionViolation {
    #[must_use]
    pub fn new(condition: impl Into<String>, message: Option<LocalizedText>) -> Self {
        Self {
            condition: condition.into(),
            message,
        }
    }
}

/// Classification of one linked-condition bundle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedConditionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<LocalizedText>,
    pub conditions: Vec<String>,
}
