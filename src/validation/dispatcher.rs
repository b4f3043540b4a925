//! Condition dispatch and group aggregation

use super::{ConditionOutcome, ConditionViolation, GroupOutcome, LinkedConditionResult};
use crate::config::ExternalConditionStrategy;
use crate::expr::EvaluationContext;
use crate::external::{ExternalCondition, ExternalConditionRequest, ExternalConditionResolver};
use crate::model::{AndConditionGroup, BusinessRule, LinkedCondition, OrConditionGroup, RuleDocument};
use core::any::Any;

const LOG_TARGET: &str = "conditions";

/// Evaluates condition names for one certificate, region, and requested profile
pub struct ConditionDispatcher<'a> {
    pub document: &'a RuleDocument,
    pub context: &'a EvaluationContext,
    pub resolver: Option<&'a dyn ExternalConditionResolver>,
    pub strategy: ExternalConditionStrategy,
    pub region: &'a str,
    pub profile: &'a str,
    pub original: Option<&'a (dyn Any + Send + Sync)>,
}

impl ConditionDispatcher<'_> {
    /// Evaluates a single condition referenced by `rule`.
    pub fn evaluate(&self, name: &str, rule: &BusinessRule) -> ConditionOutcome {
        let outcome = if ExternalCondition::is_external(name) {
            self.evaluate_external(name, rule)
        } else {
            self.evaluate_internal(name)
        };

        log::trace!(target: LOG_TARGET, "Rule '{}': condition '{name}' is {outcome:?}", rule.id);
        outcome
    }

    fn evaluate_internal(&self, name: &str) -> ConditionOutcome {
        let Some(condition) = self.document.condition(name) else {
            log::debug!(target: LOG_TARGET, "Condition '{name}' is not defined");
            return ConditionOutcome::Failed(name.to_string());
        };

        match condition.logic.evaluate(self.context) {
            Some(true) => ConditionOutcome::Fulfilled,
            Some(false) => ConditionOutcome::Violated(ConditionViolation::new(name, condition.violation_description.clone())),
            None => ConditionOutcome::Failed(name.to_string()),
        }
    }

    fn evaluate_external(&self, name: &str, rule: &BusinessRule) -> ConditionOutcome {
        let Some(external) = ExternalCondition::parse(name) else {
            return ConditionOutcome::Failed(name.to_string());
        };

        let resolved = self.resolver.and_then(|resolver| {
            resolver.resolve(&ExternalConditionRequest {
                condition: &external.name,
                parameters: &external.parameters,
                rule_id: &rule.id,
                rule_certificate_type: rule.certificate_type.as_deref(),
                region: self.region,
                profile: self.profile,
                original: self.original,
            })
        });

        match resolved {
            Some(true) => ConditionOutcome::Fulfilled,
            Some(false) => ConditionOutcome::Violated(ConditionViolation::new(name, None)),
            None => match self.strategy {
                ExternalConditionStrategy::DefaultToTrue => ConditionOutcome::Fulfilled,
                ExternalConditionStrategy::DefaultToFalse => ConditionOutcome::Violated(ConditionViolation::new(name, None)),
                ExternalConditionStrategy::FailCondition => ConditionOutcome::Failed(name.to_string()),
            },
        }
    }

    /// Evaluates every member of an AND-group, without short-circuiting.
    pub fn evaluate_and(&self, group: &[String], rule: &BusinessRule) -> Vec<ConditionOutcome> {
        group.iter().map(|name| self.evaluate(name, rule)).collect()
    }

    pub fn all_fulfilled(&self, group: &[String], rule: &BusinessRule) -> GroupOutcome {
        GroupOutcome::all(self.evaluate_and(group, rule))
    }

    /// Evaluates an OR-group, stopping at the first fully fulfilled AND-group.
    ///
    /// An absent OR-group is fulfilled.
    pub fn any_fulfilled(&self, group: Option<&OrConditionGroup>, rule: &BusinessRule) -> GroupOutcome {
        let Some(group) = group else {
            return GroupOutcome::Fulfilled;
        };

        let mut unfulfilled = Vec::new();
        for and_group in group {
            let outcomes = self.evaluate_and(and_group, rule);
            if outcomes.iter().all(ConditionOutcome::is_fulfilled) {
                return GroupOutcome::Fulfilled;
            }
            unfulfilled.extend(outcomes);
        }

        GroupOutcome::from_unfulfilled(unfulfilled)
    }

    /// Returns the first AND-group of `group` whose conditions are all fulfilled.
    pub fn first_fulfilled<'g>(&self, group: &'g OrConditionGroup, rule: &BusinessRule) -> Option<&'g AndConditionGroup> {
        group
            .iter()
            .find(|and_group| self.evaluate_and(and_group, rule).iter().all(ConditionOutcome::is_fulfilled))
    }

    /// Splits linked-condition bundles into matching and violated-or-failed ones, keeping their order.
    pub fn classify_linked(&self, linked: &[LinkedCondition], rule: &BusinessRule) -> (Vec<LinkedConditionResult>, Vec<LinkedConditionResult>) {
        let mut matching = Vec::new();
        let mut unmatched = Vec::new();

        for bundle in linked {
            let result = LinkedConditionResult {
                message: bundle.violation_description.clone(),
                conditions: bundle.conditions.clone(),
            };

            if self.all_fulfilled(&bundle.conditions, rule).is_fulfilled() {
                matching.push(result);
            } else {
                unmatched.push(result);
            }
        }

        (matching, unmatched)
    }
}
