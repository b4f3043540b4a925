use super::LocalizedText;
use crate::expr::Expression;
use serde::{Deserialize, Serialize};

/// Condition names that must all be fulfilled
pub type AndConditionGroup = Vec<String>;

/// Alternatives of which at least one [`AndConditionGroup`] must be fulfilled
pub type OrConditionGroup = Vec<AndConditionGroup>;

/// A named predicate defined once per document and referenced by name from rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub logic: Expression,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_description: Option<LocalizedText>,
}

impl Condition {
    #[must_use]
    pub fn new(logic: impl Into<String>) -> Self {
        Self {
            logic: Expression::new(logic),
            violation_description: None,
        }
    }

    #[must_use]
    pub fn with_violation_description(mut self, description: LocalizedText) -> Self {
        self.violation_description = Some(description);
        self
    }
}

/// An informational bundle reported next to a valid result
///
/// Linked conditions never change the outcome of a validation; they tell the caller which
/// additional statements hold for the certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedCondition {
    pub conditions: AndConditionGroup,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_description: Option<LocalizedText>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_condition() {
        let condition: Condition = serde_json::from_str(
            r#"{"logic": "payload.v[0].dn >= payload.v[0].sd", "violation_description": {"en": "Incomplete", "de-DE": "Unvollständig"}}"#,
        )
        .unwrap();
        assert_eq!(condition.logic.source(), "payload.v[0].dn >= payload.v[0].sd");
        let description = condition.violation_description.unwrap();
        assert_eq!(description.get("de"), Some("Unvollständig"));
    }

    #[test]
    fn test_parse_condition_without_description() {
        let condition: Condition = serde_json::from_str(r#"{"logic": "true"}"#).unwrap();
        assert_eq!(condition, Condition::new("true"));
    }

    #[test]
    fn test_parse_linked_condition() {
        let linked: LinkedCondition = serde_json::from_str(r#"{"conditions": ["a", "b"]}"#).unwrap();
        assert_eq!(linked.conditions, vec!["a", "b"]);
        assert!(linked.violation_description.is_none());
    }
}
