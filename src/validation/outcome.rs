use super::ConditionViolation;

/// Result of evaluating a single condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionOutcome {
    Fulfilled,
    Violated(ConditionViolation),

    /// The condition could not be evaluated; carries the condition name
    Failed(String),
}

impl ConditionOutcome {
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }
}

/// Aggregated result of a condition group
///
/// Failures take priority over violations: a group that has any failed condition reports
/// only the failed names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupOutcome {
    Fulfilled,
    Violated(Vec<ConditionViolation>),
    Failed(Vec<String>),
}

impl GroupOutcome {
    #[must_use]
    pub const fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled)
    }

    /// Summarizes outcomes that are known to contain at least one non-fulfilled entry.
    ///
    /// With no failure and no violation present the group is considered failed with a
    /// single condition of empty name.
    #[must_use]
    pub fn from_unfulfilled(outcomes: Vec<ConditionOutcome>) -> Self {
        let mut violations = Vec::new();
        let mut failed = Vec::new();

        for outcome in outcomes {
            match outcome {
                ConditionOutcome::Fulfilled => {}
                ConditionOutcome::Violated(violation) => violations.push(violation),
                ConditionOutcome::Failed(name) => failed.push(name),
            }
        }

        if !failed.is_empty() {
            Self::Failed(failed)
        } else if !violations.is_empty() {
            Self::Violated(violations)
        } else {
            Self::Failed(vec![String::new()])
        }
    }

    /// Summarizes the outcomes of an AND-group.
    #[must_use]
    pub fn all(outcomes: Vec<ConditionOutcome>) -> Self {
        if outcomes.iter().all(ConditionOutcome::is_fulfilled) {
            Self::Fulfilled
        } else {
            Self::from_unfulfilled(outcomes)
        }
    }
}
