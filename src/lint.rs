//! Static cross-reference checks for rule documents
//!
//! [`RuleDocument::lint`] reports references that cannot be resolved (conditions, profiles,
//! target groups), the reserved target group name, and delegation chains longer than one
//! step. External conditions are never checked since they are resolved outside the document.

use crate::external::ExternalCondition;
use crate::model::{ALL_GROUPS, BusinessRule, RuleDocument, RuleSet};
use core::fmt;
use serde::Serialize;

/// A structural problem in a rule document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum SyntaxError {
    /// A referenced condition is not defined in the document
    UnavailableCondition { condition: String },

    /// A profile rule-set is keyed by a target group the rule does not define
    UnavailableTargetGroup { target_group: String },

    /// A rule-set exists for, or delegates to, a profile the document does not define
    UnavailableProfile { profile: String },

    /// A rule defines a target group with a reserved name
    ReservedTargetGroupName { name: String },

    /// A rule-set delegates to a profile that has no rule-set in the same rule
    UnknownLinkedProfile { profile: String },

    /// The delegated-to profile has no rule-set for the delegating group
    UnknownTargetGroupInLinkedProfile { profile: String, target_group: String },

    /// The delegated-to rule-set delegates again
    UnallowedMultistepProfileChain { profile: String, target_group: String },
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnavailableCondition { condition } => write!(f, "condition '{condition}' is not defined"),
            Self::UnavailableTargetGroup { target_group } => write!(f, "target group '{target_group}' is not defined by the rule"),
            Self::UnavailableProfile { profile } => write!(f, "profile '{profile}' is not defined"),
            Self::ReservedTargetGroupName { name } => write!(f, "target group name '{name}' is reserved"),
            Self::UnknownLinkedProfile { profile } => write!(f, "linked profile '{profile}' has no rule-set in the rule"),
            Self::UnknownTargetGroupInLinkedProfile { profile, target_group } => {
                write!(f, "linked profile '{profile}' has no rule-set for target group '{target_group}'")
            }
            Self::UnallowedMultistepProfileChain { profile, target_group } => {
                write!(f, "linked profile '{profile}' delegates again for target group '{target_group}'")
            }
        }
    }
}

impl RuleDocument {
    /// Checks every rule for unresolved references, in document order.
    ///
    /// An empty list means the document is consistent.
    #[must_use]
    pub fn lint(&self) -> Vec<SyntaxError> {
        let mut errors = Vec::new();
        for rule in &self.rules {
            self.lint_rule(rule, &mut errors);
        }
        errors
    }

    fn lint_rule(&self, rule: &BusinessRule, errors: &mut Vec<SyntaxError>) {
        if let Some(general) = &rule.general_conditions {
            self.check_conditions(general, errors);
        }
        self.check_conditions(&rule.certificate_type_conditions, errors);

        if let Some(groups) = &rule.groups {
            for guard in groups.values() {
                self.check_conditions(guard.iter().flatten(), errors);
            }

            if groups.contains_key(ALL_GROUPS) {
                errors.push(SyntaxError::ReservedTargetGroupName { name: ALL_GROUPS.to_string() });
            }
        }

        for profile in rule.profiles.keys() {
            if self.profile(profile).is_none() {
                errors.push(SyntaxError::UnavailableProfile { profile: profile.to_string() });
            }
        }

        for profile_rule_set in rule.profiles.values() {
            for rule_set in profile_rule_set.values() {
                self.lint_rule_set(rule_set, errors);
            }

            for group in profile_rule_set.keys() {
                let defined = rule.groups.as_ref().is_some_and(|groups| groups.contains_key(group));
                if group != ALL_GROUPS && !defined {
                    errors.push(SyntaxError::UnavailableTargetGroup { target_group: group.to_string() });
                }
            }
        }

        for profile_rule_set in rule.profiles.values() {
            for (group, rule_set) in profile_rule_set.iter() {
                if let Some(linked) = rule_set.equal_to_profile()
                    && let Some(error) = check_delegation_target(rule, linked, group)
                {
                    errors.push(error);
                }
            }
        }
    }

    fn lint_rule_set(&self, rule_set: &RuleSet, errors: &mut Vec<SyntaxError>) {
        if let RuleSet::Conditional(conditional) = rule_set
            && let Some(conditions) = &conditional.conditions
        {
            self.check_conditions(conditions.iter().flatten(), errors);
        }

        for linked in rule_set.linked_conditions() {
            self.check_conditions(&linked.conditions, errors);
        }

        if let Some(profile) = rule_set.equal_to_profile()
            && self.profile(profile).is_none()
        {
            errors.push(SyntaxError::UnavailableProfile { profile: profile.to_string() });
        }

        for time in rule_set.validity_times() {
            if let Some(guard) = &time.conditions {
                self.check_conditions(guard.iter().flatten(), errors);
            }
        }
    }

    fn check_conditions<'n>(&self, names: impl IntoIterator<Item = &'n String>, errors: &mut Vec<SyntaxError>) {
        errors.extend(
            names
                .into_iter()
                .filter(|name| !ExternalCondition::is_external(name) && self.condition(name).is_none())
                .map(|name| SyntaxError::UnavailableCondition { condition: name.clone() }),
        );
    }
}

fn check_delegation_target(rule: &BusinessRule, profile: &str, group: &str) -> Option<SyntaxError> {
    let Some(profile_rule_set) = rule.profiles.get(profile) else {
        return Some(SyntaxError::UnknownLinkedProfile { profile: profile.to_string() });
    };

    let Some(rule_set) = profile_rule_set.get(group) else {
        return Some(SyntaxError::UnknownTargetGroupInLinkedProfile {
            profile: profile.to_string(),
            target_group: group.to_string(),
        });
    };

    rule_set.equal_to_profile().map(|_| SyntaxError::UnallowedMultistepProfileChain {
        profile: profile.to_string(),
        target_group: group.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(rules: &serde_json::Value) -> RuleDocument {
        serde_json::from_value(json!({
            "profiles": [{"id": "Entry"}, {"id": "Club"}, {"id": "Work"}],
            "conditions": {
                "isVaccination": {"logic": "true"},
                "isAdult": {"logic": "true"},
                "isFullVaccination": {"logic": "true"}
            },
            "rules": rules
        }))
        .unwrap()
    }

    fn rule(extra: &serde_json::Value) -> serde_json::Value {
        let mut rule = json!({
            "id": "R-1",
            "schema_version": 1,
            "regions": {"include": ["all"]},
            "certificate_type_conditions": ["isVaccination"],
            "profiles": {"Entry": {"all": {"conditions": [["isFullVaccination"]]}}}
        });
        if let (Some(target), Some(extra)) = (rule.as_object_mut(), extra.as_object()) {
            target.extend(extra.clone());
        }
        rule
    }

    #[test]
    fn test_consistent_document() {
        let document = document(&json!([rule(&json!({}))]));
        assert!(document.lint().is_empty());
    }

    #[test]
    fn test_unknown_conditions_everywhere() {
        let document = document(&json!([rule(&json!({
            "certificate_type_conditions": ["isSomeUnknownCertificateTypeCondition"],
            "general_conditions": ["isSomeUnknownGeneralCondition", "ext.isExternal__a:b"],
            "profiles": {
                "Entry": {"all": {
                    "conditions": [["isFullVaccination"], ["isSomeUnknownCondition"]],
                    "linked_conditions": [{"conditions": ["isAnotherUnknownCondition"]}],
                    "valid_until": [{"value": "2022-01-01", "conditions": [["isUnknownGuard"]]}]
                }}
            }
        }))]));

        assert_eq!(
            document.lint(),
            vec![
                SyntaxError::UnavailableCondition { condition: "isSomeUnknownGeneralCondition".into() },
                SyntaxError::UnavailableCondition { condition: "isSomeUnknownCertificateTypeCondition".into() },
                SyntaxError::UnavailableCondition { condition: "isSomeUnknownCondition".into() },
                SyntaxError::UnavailableCondition { condition: "isAnotherUnknownCondition".into() },
                SyntaxError::UnavailableCondition { condition: "isUnknownGuard".into() },
            ]
        );
    }

    #[test]
    fn test_reserved_group_name() {
        let document = document(&json!([rule(&json!({"groups": {"all": [["isAdult"]]}}))]));
        assert_eq!(document.lint(), vec![SyntaxError::ReservedTargetGroupName { name: "all".into() }]);
    }

    #[test]
    fn test_unknown_target_group() {
        let document = document(&json!([rule(&json!({
            "groups": {"adults": [["isAdult"]], "children": [["isUnknownChild"]]},
            "profiles": {"Entry": {"adults": {}, "childrenUnknown": {"invalid": true}}}
        }))]));
        assert_eq!(
            document.lint(),
            vec![
                SyntaxError::UnavailableCondition { condition: "isUnknownChild".into() },
                SyntaxError::UnavailableTargetGroup { target_group: "childrenUnknown".into() },
            ]
        );
    }

    #[test]
    fn test_unknown_profiles() {
        let document = document(&json!([rule(&json!({
            "profiles": {
                "Entry": {"all": {}},
                "Nightlife": {"all": {"equal_to_profile": "Entry"}},
                "Club": {"all": {"equal_to_profile": "Party"}}
            }
        }))]));
        assert_eq!(
            document.lint(),
            vec![
                SyntaxError::UnavailableProfile { profile: "Nightlife".into() },
                SyntaxError::UnavailableProfile { profile: "Party".into() },
                SyntaxError::UnknownLinkedProfile { profile: "Party".into() },
            ]
        );
    }

    #[test]
    fn test_linked_profile_without_group() {
        let document = document(&json!([rule(&json!({
            "groups": {"adults": [["isAdult"]]},
            "profiles": {
                "Entry": {"all": {}},
                "Club": {"adults": {"equal_to_profile": "Entry"}}
            }
        }))]));
        assert_eq!(
            document.lint(),
            vec![SyntaxError::UnknownTargetGroupInLinkedProfile {
                profile: "Entry".into(),
                target_group: "adults".into()
            }]
        );
    }

    #[test]
    fn test_multistep_chain_reported_once() {
        let document = document(&json!([rule(&json!({
            "profiles": {
                "Entry": {"all": {}},
                "Club": {"all": {"equal_to_profile": "Entry"}},
                "Work": {"all": {"equal_to_profile": "Club"}}
            }
        }))]));
        assert_eq!(
            document.lint(),
            vec![SyntaxError::UnallowedMultistepProfileChain {
                profile: "Club".into(),
                target_group: "all".into()
            }]
        );
    }

    #[test]
    fn test_errors_accumulate_across_rules() {
        let second = json!({"id": "R-2", "general_conditions": ["isMissing"]});
        let document = document(&json!([rule(&json!({})), rule(&second)]));
        assert_eq!(document.lint(), vec![SyntaxError::UnavailableCondition { condition: "isMissing".into() }]);
    }

    #[test]
    fn test_display_and_serialize() {
        let error = SyntaxError::UnallowedMultistepProfileChain {
            profile: "Club".into(),
            target_group: "all".into(),
        };
        assert_eq!(error.to_string(), "linked profile 'Club' delegates again for target group 'all'");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"error": "unallowed_multistep_profile_chain", "profile": "Club", "target_group": "all"})
        );
    }
}
