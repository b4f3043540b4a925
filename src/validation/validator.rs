use super::dispatcher::ConditionDispatcher;
use super::times::{self, Direction};
use super::{Certificate, GroupOutcome, ValidProfileResult, ValidationResult};
use crate::config::EngineConfig;
use crate::expr::EvaluationContext;
use crate::external::ExternalConditionResolver;
use crate::model::{ALL_GROUPS, BusinessRule, ConditionalRuleSet, DelegatingRuleSet, ProfileRuleSet, RuleDocument, RuleSet, ValueSets};
use chrono::{DateTime, Utc};
use core::fmt;
use std::collections::BTreeMap;

const LOG_TARGET: &str = " validator";

/// Validates certificates against a rule document
///
/// A validator borrows the document and value sets, so many validators (for different
/// clocks or resolvers) can share one loaded document.
pub struct Validator<'a> {
    document: &'a RuleDocument,
    value_sets: &'a ValueSets,
    validation_clock: DateTime<Utc>,
    resolver: Option<&'a dyn ExternalConditionResolver>,
    config: EngineConfig,
}

/// Per-call state shared by the whole rule scan, including delegated scans
struct Evaluation<'a> {
    certificate: &'a Certificate,
    context: &'a EvaluationContext,
    region: &'a str,

    /// The profile the caller asked for
    requested_profile: &'a str,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub fn new(document: &'a RuleDocument, value_sets: &'a ValueSets, validation_clock: DateTime<Utc>) -> Self {
        Self {
            document,
            value_sets,
            validation_clock,
            resolver: None,
            config: EngineConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_resolver(mut self, resolver: &'a dyn ExternalConditionResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub const fn validation_clock(&self) -> DateTime<Utc> {
        self.validation_clock
    }

    /// Builds the evaluation context conditions of `certificate` are evaluated against.
    #[must_use]
    pub fn context(&self, certificate: &Certificate) -> EvaluationContext {
        EvaluationContext::new(
            &certificate.payload,
            &certificate.external_parameters(self.value_sets, self.validation_clock),
        )
    }

    /// Replaces `#path#` placeholders in `text` with values from the certificate's evaluation context.
    #[must_use]
    pub fn interpolate(&self, certificate: &Certificate, text: &str) -> String {
        self.context(certificate).interpolate(text)
    }

    /// Validates `certificate` for one profile in one region.
    ///
    /// Returns `None` when no rule applies, when the selected rule has nothing to say about
    /// the profile, or when the certificate belongs to none of the rule's target groups.
    #[must_use]
    pub fn evaluate(&self, certificate: &Certificate, region: &str, profile: &str) -> Option<ValidationResult> {
        let context = self.context(certificate);
        let evaluation = Evaluation {
            certificate,
            context: &context,
            region,
            requested_profile: profile,
        };

        self.evaluate_profile(&evaluation, profile, 0)
    }

    /// Validates `certificate` for several profiles, sharing one evaluation context.
    ///
    /// With `profiles` set to `None` every profile of the document is evaluated. Profiles
    /// without a result are left out of the returned map.
    #[must_use]
    pub fn evaluate_all(&self, certificate: &Certificate, region: &str, profiles: Option<&[&str]>) -> BTreeMap<String, ValidationResult> {
        let context = self.context(certificate);
        let profiles: Vec<&str> = profiles.map_or_else(|| self.document.profile_ids().collect(), <[&str]>::to_vec);

        profiles
            .into_iter()
            .filter_map(|profile| {
                let evaluation = Evaluation {
                    certificate,
                    context: &context,
                    region,
                    requested_profile: profile,
                };
                self.evaluate_profile(&evaluation, profile, 0)
                    .map(|result| (profile.to_string(), result))
            })
            .collect()
    }

    fn dispatcher<'e>(&'e self, evaluation: &'e Evaluation<'e>) -> ConditionDispatcher<'e> {
        ConditionDispatcher {
            document: self.document,
            context: evaluation.context,
            resolver: self.resolver,
            strategy: self.config.external_condition_strategy,
            region: evaluation.region,
            profile: evaluation.requested_profile,
            original: evaluation.certificate.original.as_deref(),
        }
    }

    fn evaluate_profile(&self, evaluation: &Evaluation<'_>, profile: &str, depth: usize) -> Option<ValidationResult> {
        let dispatcher = self.dispatcher(evaluation);

        let Some(rule) = self.document.rules.iter().find(|rule| self.rule_applies(&dispatcher, evaluation, rule)) else {
            log::debug!(target: LOG_TARGET, "No applicable rule for profile '{profile}' in region '{}'", evaluation.region);
            return None;
        };

        log::debug!(target: LOG_TARGET, "Using rule '{}' for profile '{profile}'", rule.id);

        if let Some(general) = &rule.general_conditions {
            match dispatcher.all_fulfilled(general, rule) {
                GroupOutcome::Fulfilled => {}
                GroupOutcome::Violated(violations) => return Some(ValidationResult::Invalid { violations }),
                GroupOutcome::Failed(failed_conditions) => return Some(ValidationResult::Error { failed_conditions }),
            }
        }

        let Some(profile_rule_set) = rule.profiles.get(profile) else {
            log::debug!(target: LOG_TARGET, "Rule '{}' has no rule-set for profile '{profile}'", rule.id);
            return None;
        };

        let rule_set = Self::select_rule_set(&dispatcher, rule, profile_rule_set)?;
        self.resolve_rule_set(evaluation, &dispatcher, rule, rule_set, profile, depth)
    }

    /// Gates 1 to 5: a rule that fails any of them is skipped and the scan continues.
    fn rule_applies(&self, dispatcher: &ConditionDispatcher<'_>, evaluation: &Evaluation<'_>, rule: &BusinessRule) -> bool {
        if !rule.supports_schema_version(self.config.supported_schema_version) {
            log::trace!(target: LOG_TARGET, "Skipping rule '{}': schema version {} not supported", rule.id, rule.schema_version);
            return false;
        }

        if !rule.is_in_force(self.validation_clock) {
            log::trace!(target: LOG_TARGET, "Skipping rule '{}': not in force", rule.id);
            return false;
        }

        if !rule.regions.applies_to(evaluation.region) {
            log::trace!(target: LOG_TARGET, "Skipping rule '{}': region '{}' not covered", rule.id, evaluation.region);
            return false;
        }

        if rule
            .certificate_type()
            .is_some_and(|certificate_type| certificate_type != evaluation.certificate.certificate_type)
        {
            log::trace!(target: LOG_TARGET, "Skipping rule '{}': certificate type mismatch", rule.id);
            return false;
        }

        if !dispatcher.all_fulfilled(&rule.certificate_type_conditions, rule).is_fulfilled() {
            log::trace!(target: LOG_TARGET, "Skipping rule '{}': certificate type conditions not fulfilled", rule.id);
            return false;
        }

        true
    }

    fn select_rule_set<'r>(dispatcher: &ConditionDispatcher<'_>, rule: &'r BusinessRule, profile_rule_set: &'r ProfileRuleSet) -> Option<&'r RuleSet> {
        let solely_all = profile_rule_set.len() == 1 && profile_rule_set.contains_key(ALL_GROUPS);

        let Some(groups) = rule.target_groups().filter(|_| !solely_all) else {
            return profile_rule_set.get(ALL_GROUPS);
        };

        let Some((group, _)) = groups
            .iter()
            .find(|(_, guard)| dispatcher.any_fulfilled(Some(guard), rule).is_fulfilled())
        else {
            log::debug!(target: LOG_TARGET, "Rule '{}': certificate belongs to no target group", rule.id);
            return None;
        };

        log::debug!(target: LOG_TARGET, "Rule '{}': selected target group '{group}'", rule.id);
        profile_rule_set.get(group)
    }

    fn resolve_rule_set(
        &self,
        evaluation: &Evaluation<'_>,
        dispatcher: &ConditionDispatcher<'_>,
        rule: &BusinessRule,
        rule_set: &RuleSet,
        profile: &str,
        depth: usize,
    ) -> Option<ValidationResult> {
        match rule_set {
            RuleSet::Invalid => Some(ValidationResult::Invalid { violations: Vec::new() }),
            RuleSet::Conditional(conditional) => Some(Self::resolve_conditional(dispatcher, rule, conditional, profile, evaluation.region)),
            RuleSet::EqualTo(delegating) => self.resolve_delegating(evaluation, dispatcher, rule, delegating, profile, depth),
        }
    }

    fn resolve_conditional(
        dispatcher: &ConditionDispatcher<'_>,
        rule: &BusinessRule,
        conditional: &ConditionalRuleSet,
        profile: &str,
        region: &str,
    ) -> ValidationResult {
        match dispatcher.any_fulfilled(conditional.conditions.as_ref(), rule) {
            GroupOutcome::Fulfilled => {
                let (matching, unmatched) = dispatcher.classify_linked(&conditional.linked_conditions, rule);
                ValidationResult::Valid(ValidProfileResult {
                    profile: profile.to_string(),
                    region: region.to_string(),
                    valid_from: times::resolve(dispatcher, rule, &conditional.valid_from, Direction::From),
                    valid_until: times::resolve(dispatcher, rule, &conditional.valid_until, Direction::Until),
                    matching_linked_conditions: matching,
                    violated_or_failed_linked_conditions: unmatched,
                })
            }
            GroupOutcome::Violated(violations) => ValidationResult::Invalid { violations },
            GroupOutcome::Failed(_) => ValidationResult::Invalid { violations: Vec::new() },
        }
    }

    fn resolve_delegating(
        &self,
        evaluation: &Evaluation<'_>,
        dispatcher: &ConditionDispatcher<'_>,
        rule: &BusinessRule,
        delegating: &DelegatingRuleSet,
        profile: &str,
        depth: usize,
    ) -> Option<ValidationResult> {
        if depth >= self.config.max_delegation_depth {
            log::warn!(
                target: LOG_TARGET,
                "Rule '{}': delegation from '{profile}' to '{}' exceeds the maximum depth of {}",
                rule.id,
                delegating.profile,
                self.config.max_delegation_depth
            );
            return None;
        }

        log::debug!(target: LOG_TARGET, "Rule '{}': profile '{profile}' delegates to '{}'", rule.id, delegating.profile);

        let delegated = match self.evaluate_profile(evaluation, &delegating.profile, depth + 1)? {
            ValidationResult::Valid(delegated) => delegated,
            other => return Some(other),
        };

        let valid_from = delegating
            .valid_from
            .as_deref()
            .map_or(delegated.valid_from, |candidates| times::resolve(dispatcher, rule, candidates, Direction::From));
        let valid_until = delegating
            .valid_until
            .as_deref()
            .map_or(delegated.valid_until, |candidates| times::resolve(dispatcher, rule, candidates, Direction::Until));
        let (matching, unmatched) = dispatcher.classify_linked(&delegating.linked_conditions, rule);

        Some(ValidationResult::Valid(ValidProfileResult {
            profile: profile.to_string(),
            region: delegated.region,
            valid_from,
            valid_until,
            matching_linked_conditions: matching,
            violated_or_failed_linked_conditions: unmatched,
        }))
    }
}

impl fmt::Debug for Validator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.document.rules.len())
            .field("validation_clock", &self.validation_clock)
            .field("has_resolver", &self.resolver.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
