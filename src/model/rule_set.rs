use super::{LinkedCondition, OrConditionGroup, ValidityTime};
use serde::{Deserialize, Serialize};

/// What a profile decides for one target group of a rule
///
/// On the wire a rule-set is a single object with optional fields; `equal_to_profile`
/// takes precedence over `invalid`, which takes precedence over a conditional rule-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RuleSetData", into = "RuleSetData")]
pub enum RuleSet {
    /// The certificate is unconditionally invalid for this profile and group
    Invalid,

    /// The certificate is valid when the guard is fulfilled
    Conditional(ConditionalRuleSet),

    /// The outcome is taken from another profile
    EqualTo(DelegatingRuleSet),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionalRuleSet {
    /// `None` is vacuously fulfilled
    pub conditions: Option<OrConditionGroup>,
    pub valid_from: Vec<ValidityTime>,
    pub valid_until: Vec<ValidityTime>,
    pub linked_conditions: Vec<LinkedCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatingRuleSet {
    /// Profile whose result is reused
    pub profile: String,

    /// Replaces the delegated valid-from candidates when present
    pub valid_from: Option<Vec<ValidityTime>>,

    /// Replaces the delegated valid-until candidates when present
    pub valid_until: Option<Vec<ValidityTime>>,

    pub linked_conditions: Vec<LinkedCondition>,
}

impl RuleSet {
    /// The profile this rule-set delegates to, if any.
    #[must_use]
    pub fn equal_to_profile(&self) -> Option<&str> {
        match self {
            Self::EqualTo(delegating) => Some(&delegating.profile),
            Self::Invalid | Self::Conditional(_) => None,
        }
    }

    #[must_use]
    pub fn linked_conditions(&self) -> &[LinkedCondition] {
        match self {
            Self::Invalid => &[],
            Self::Conditional(conditional) => &conditional.linked_conditions,
            Self::EqualTo(delegating) => &delegating.linked_conditions,
        }
    }

    /// Every validity-time candidate of this rule-set, valid-from first.
    pub fn validity_times(&self) -> impl Iterator<Item = &ValidityTime> {
        let (from, until): (&[ValidityTime], &[ValidityTime]) = match self {
            Self::Invalid => (&[], &[]),
            Self::Conditional(conditional) => (&conditional.valid_from, &conditional.valid_until),
            Self::EqualTo(delegating) => (
                delegating.valid_from.as_deref().unwrap_or_default(),
                delegating.valid_until.as_deref().unwrap_or_default(),
            ),
        };
        from.iter().chain(until)
    }
}

#[derive(Default, Serialize, Deserialize)]
struct RuleSetData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditions: Option<OrConditionGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_from: Option<Vec<ValidityTime>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    valid_until: Option<Vec<ValidityTime>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    invalid: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    equal_to_profile: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    linked_conditions: Option<Vec<LinkedCondition>>,
}

impl From<RuleSetData> for RuleSet {
    fn from(data: RuleSetData) -> Self {
        if let Some(profile) = data.equal_to_profile {
            return Self::EqualTo(DelegatingRuleSet {
                profile,
                valid_from: data.valid_from,
                valid_until: data.valid_until,
                linked_conditions: data.linked_conditions.unwrap_or_default(),
            });
        }

        if data.invalid == Some(true) {
            return Self::Invalid;
        }

        Self::Conditional(ConditionalRuleSet {
            conditions: data.conditions,
            valid_from: data.valid_from.unwrap_or_default(),
            valid_until: data.valid_until.unwrap_or_default(),
            linked_conditions: data.linked_conditions.unwrap_or_default(),
        })
    }
}

impl From<RuleSet> for RuleSetData {
    fn from(rule_set: RuleSet) -> Self {
        match rule_set {
            RuleSet::Invalid => Self {
                invalid: Some(true),
                ..Self::default()
            },
            RuleSet::Conditional(conditional) => Self {
                conditions: conditional.conditions,
                valid_from: non_empty(conditional.valid_from),
                valid_until: non_empty(conditional.valid_until),
                linked_conditions: non_empty(conditional.linked_conditions),
                ..Self::default()
            },
            RuleSet::EqualTo(delegating) => Self {
                equal_to_profile: Some(delegating.profile),
                valid_from: delegating.valid_from,
                valid_until: delegating.valid_until,
                linked_conditions: non_empty(delegating.linked_conditions),
                ..Self::default()
            },
        }
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_conditional() {
        let rule_set: RuleSet = serde_json::from_str(
            r#"{"conditions": [["a", "b"], ["c"]], "valid_from": [{"value": "2021-01-01T00:00:00Z"}], "linked_conditions": [{"conditions": ["d"]}]}"#,
        )
        .unwrap();

        let RuleSet::Conditional(conditional) = rule_set else {
            panic!("expected a conditional rule-set");
        };
        assert_eq!(conditional.conditions.unwrap().len(), 2);
        assert_eq!(conditional.valid_from.len(), 1);
        assert!(conditional.valid_until.is_empty());
        assert_eq!(conditional.linked_conditions.len(), 1);
    }

    #[test]
    fn test_parse_empty_object_is_unconditional() {
        let rule_set: RuleSet = serde_json::from_str("{}").unwrap();
        assert_eq!(rule_set, RuleSet::Conditional(ConditionalRuleSet::default()));
    }

    #[test]
    fn test_parse_invalid_marker() {
        assert_eq!(serde_json::from_str::<RuleSet>(r#"{"invalid": true}"#).unwrap(), RuleSet::Invalid);
        assert!(matches!(
            serde_json::from_str::<RuleSet>(r#"{"invalid": false}"#).unwrap(),
            RuleSet::Conditional(_)
        ));
    }

    #[test]
    fn test_equal_to_takes_precedence() {
        let rule_set: RuleSet = serde_json::from_str(r#"{"invalid": true, "equal_to_profile": "Entry", "valid_until": []}"#).unwrap();
        assert_eq!(rule_set.equal_to_profile(), Some("Entry"));
        let RuleSet::EqualTo(delegating) = rule_set else {
            panic!("expected a delegating rule-set");
        };
        assert!(delegating.valid_from.is_none());
        assert_eq!(delegating.valid_until, Some(Vec::new()));
    }

    #[test]
    fn test_serialize_invalid_marker() {
        assert_eq!(serde_json::to_string(&RuleSet::Invalid).unwrap(), r#"{"invalid":true}"#);
    }

    #[test]
    fn test_validity_times_lists_both_directions() {
        let rule_set: RuleSet = serde_json::from_str(
            r#"{"valid_from": [{"value": "a"}], "valid_until": [{"value": "b"}, {"value": "c"}]}"#,
        )
        .unwrap();
        let values: Vec<_> = rule_set.validity_times().map(|time| time.value.as_str()).collect();
        assert_eq!(values, vec!["a", "b", "c"]);
    }
}
