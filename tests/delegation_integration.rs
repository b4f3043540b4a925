//! Integration tests for `equal_to_profile` delegation.

use cert_rules::validation::ConditionViolation;
use cert_rules::{
    Certificate, CertificateType, EngineConfig, ExternalConditionRequest, RuleDocument, SyntaxError, ValidationResult, Validator, ValueSets,
};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

fn document(profiles: &serde_json::Value) -> RuleDocument {
    let document = json!({
        "profiles": [{"id": "Entry"}, {"id": "Club"}, {"id": "Nightlife"}],
        "conditions": {"isTest": {"logic": "size(payload.t) > 0"}},
        "rules": [{
            "id": "T-1",
            "certificate_type": "test",
            "schema_version": 1,
            "regions": {"include": ["all"]},
            "certificate_type_conditions": ["isTest"],
            "profiles": profiles
        }]
    });
    RuleDocument::from_json(&document.to_string()).expect("inline document should parse")
}

fn certificate() -> Certificate {
    Certificate::new(CertificateType::Test, json!({"t": [{"sc": "2022-05-01T08:30:00Z", "tr": "260415000"}]}))
}

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 5, 1, 12, 0, 0).unwrap()
}

fn chain() -> RuleDocument {
    document(&json!({
        "Entry": {"all": {
            "valid_from": [{"value": "#payload.t.0.sc#"}],
            "valid_until": [{"value": "#payload.t.0.sc#", "plus_unit": "hour", "plus_interval": 48}]
        }},
        "Club": {"all": {
            "equal_to_profile": "Entry",
            "valid_until": [{"value": "#payload.t.0.sc#", "plus_unit": "hour", "plus_interval": 24}]
        }},
        "Nightlife": {"all": {"equal_to_profile": "Club"}}
    }))
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_single_step_delegation_applies_overrides() {
    let document = chain();
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    let result = validator.evaluate(&certificate(), "W", "Club").expect("a rule should apply");
    let valid = result.as_valid().expect("certificate should be valid");

    assert_eq!(valid.profile, "Club");
    assert_eq!(valid.valid_from[0].time, Utc.with_ymd_and_hms(2022, 5, 1, 8, 30, 0).unwrap());
    assert_eq!(valid.valid_until[0].time, Utc.with_ymd_and_hms(2022, 5, 2, 8, 30, 0).unwrap());
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_multistep_chain_is_bounded_by_depth() {
    let document = chain();
    let value_sets = ValueSets::new();

    let validator = Validator::new(&document, &value_sets, clock());
    assert_eq!(validator.evaluate(&certificate(), "W", "Nightlife"), None);

    let config = EngineConfig {
        max_delegation_depth: 2,
        ..EngineConfig::default()
    };
    let validator = Validator::new(&document, &value_sets, clock()).with_config(config);
    let result = validator.evaluate(&certificate(), "W", "Nightlife").expect("a rule should apply");
    let valid = result.as_valid().expect("certificate should be valid");

    assert_eq!(valid.profile, "Nightlife");
    assert_eq!(valid.valid_until[0].time, Utc.with_ymd_and_hms(2022, 5, 2, 8, 30, 0).unwrap());

    assert_eq!(
        document.lint(),
        vec![SyntaxError::UnallowedMultistepProfileChain {
            profile: "Club".into(),
            target_group: "all".into()
        }]
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_delegation_cycle_terminates() {
    let document = document(&json!({
        "Entry": {"all": {"equal_to_profile": "Club"}},
        "Club": {"all": {"equal_to_profile": "Entry"}}
    }));
    let value_sets = ValueSets::new();
    let config = EngineConfig {
        max_delegation_depth: 8,
        ..EngineConfig::default()
    };
    let validator = Validator::new(&document, &value_sets, clock()).with_config(config);

    assert_eq!(validator.evaluate(&certificate(), "W", "Entry"), None);
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_delegated_invalid_result_is_reported_unchanged() {
    let document = document(&json!({
        "Entry": {"all": {"conditions": [["ext.isNegative"]]}},
        "Club": {"all": {
            "equal_to_profile": "Entry",
            "valid_until": [{"value": "#payload.t.0.sc#", "plus_unit": "hour", "plus_interval": 24}],
            "linked_conditions": [{"conditions": ["isTest"]}]
        }},
        "Nightlife": {"all": {"invalid": true}}
    }));
    let value_sets = ValueSets::new();
    let resolver = |request: &ExternalConditionRequest<'_>| {
        assert_eq!(request.profile, "Club");
        Some(false)
    };
    let validator = Validator::new(&document, &value_sets, clock()).with_resolver(&resolver);

    assert_eq!(
        validator.evaluate(&certificate(), "W", "Club"),
        Some(ValidationResult::Invalid {
            violations: vec![ConditionViolation::new("ext.isNegative", None)]
        })
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_delegation_to_profile_without_rule_set() {
    let document = document(&json!({
        "Club": {"all": {"equal_to_profile": "Entry"}}
    }));
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    assert_eq!(validator.evaluate(&certificate(), "W", "Club"), None);
    assert_eq!(document.lint(), vec![SyntaxError::UnknownLinkedProfile { profile: "Entry".into() }]);
}
