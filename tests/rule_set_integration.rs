//! Integration tests for conditional rule-set outcomes and shared use of one document.

use cert_rules::validation::ConditionViolation;
use cert_rules::{Certificate, CertificateType, RuleDocument, ValidationResult, Validator, ValueSets};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::thread;

const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RuleDocument>();
    assert_send_sync::<Validator<'static>>();
};

fn document(general: &serde_json::Value, entry: &serde_json::Value) -> RuleDocument {
    let document = json!({
        "profiles": [{"id": "Entry"}],
        "conditions": {
            "isTest": {"logic": "size(payload.t) > 0"},
            "isNegative": {
                "logic": "payload.t[0].tr == '260415000'",
                "violation_description": {"en": "Test result is positive"}
            }
        },
        "rules": [{
            "id": "T-1",
            "certificate_type": "test",
            "schema_version": 1,
            "regions": {"include": ["all"]},
            "certificate_type_conditions": ["isTest"],
            "general_conditions": general,
            "profiles": {"Entry": {"all": entry}}
        }]
    });
    RuleDocument::from_json(&document.to_string()).expect("inline document should parse")
}

fn certificate(test_result: &str) -> Certificate {
    Certificate::new(CertificateType::Test, json!({"t": [{"sc": "2022-05-01T08:30:00Z", "tr": test_result}]}))
}

fn clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 5, 1, 12, 0, 0).unwrap()
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_failed_rule_set_conditions_are_dropped() {
    let document = document(&json!([]), &json!({"conditions": [["broken"], ["ext.x"]]}));
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    assert_eq!(
        validator.evaluate(&certificate("260415000"), "W", "Entry"),
        Some(ValidationResult::Invalid { violations: Vec::new() })
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_failures_outrank_violations_in_rule_set() {
    let document = document(&json!([]), &json!({"conditions": [["isNegative"], ["broken"]]}));
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    assert_eq!(
        validator.evaluate(&certificate("260373001"), "W", "Entry"),
        Some(ValidationResult::Invalid { violations: Vec::new() })
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_failed_general_condition_is_an_error() {
    let document = document(&json!(["broken"]), &json!({}));
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    assert_eq!(
        validator.evaluate(&certificate("260415000"), "W", "Entry"),
        Some(ValidationResult::Error {
            failed_conditions: vec!["broken".to_string()]
        })
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_empty_or_group_is_invalid() {
    let document = document(&json!([]), &json!({"conditions": []}));
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    assert_eq!(
        validator.evaluate(&certificate("260415000"), "W", "Entry"),
        Some(ValidationResult::Invalid { violations: Vec::new() })
    );
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_absent_or_group_is_valid() {
    let document = document(&json!([]), &json!({}));
    let value_sets = ValueSets::new();
    let validator = Validator::new(&document, &value_sets, clock());

    assert!(validator.evaluate(&certificate("260415000"), "W", "Entry").is_some_and(|r| r.is_valid()));
}

#[test]
#[cfg_attr(miri, ignore)]
fn test_document_shared_across_threads() {
    let document = document(
        &json!([]),
        &json!({
            "conditions": [["isNegative"]],
            "valid_until": [{"value": "#payload.t.0.sc#", "plus_unit": "hour", "plus_interval": 48}]
        }),
    );
    let value_sets = ValueSets::new();
    let message = document.condition("isNegative").and_then(|c| c.violation_description.clone());

    thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let document = &document;
                let value_sets = &value_sets;
                scope.spawn(move || {
                    let validator = Validator::new(document, value_sets, clock());
                    let test_result = if n % 2 == 0 { "260415000" } else { "260373001" };
                    (n, validator.evaluate(&certificate(test_result), "W", "Entry"))
                })
            })
            .collect();

        for handle in handles {
            let (n, result) = handle.join().unwrap();
            if n % 2 == 0 {
                let result = result.expect("a rule should apply");
                let valid = result.as_valid().expect("negative test should be valid");
                assert_eq!(valid.valid_until[0].time, Utc.with_ymd_and_hms(2022, 5, 3, 8, 30, 0).unwrap());
            } else {
                assert_eq!(
                    result,
                    Some(ValidationResult::Invalid {
                        violations: vec![ConditionViolation::new("isNegative", message.clone())]
                    })
                );
            }
        }
    });
}
