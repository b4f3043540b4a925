//! Externally resolved conditions
//!
//! Condition names starting with `ext.` are not looked up in the document's condition
//! library. Instead the name is parsed into a base name and parameters and handed to an
//! [`ExternalConditionResolver`] supplied by the caller, for example to check whether the
//! holder also presents another certificate:
//!
//! ```text
//! ext.hasValidVaccinationCertificateForPerson__minDoses:2__region:W
//!     └── base name ───────────────────────┘  └─ parameters ──────┘
//! ```

use core::any::Any;
use std::collections::BTreeMap;

/// Prefix marking a condition name as external
pub const EXTERNAL_CONDITION_PREFIX: &str = "ext.";

const SEGMENT_SEPARATOR: &str = "__";
const PARAMETER_SEPARATOR: char = ':';

/// The parsed form of an external condition name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCondition {
    pub name: String,
    pub parameters: BTreeMap<String, String>,
}

impl ExternalCondition {
    #[must_use]
    pub fn is_external(name: &str) -> bool {
        name.starts_with(EXTERNAL_CONDITION_PREFIX)
    }

    /// Parses an external condition name.
    ///
    /// After the prefix the name is split on `__`, dropping empty segments. The first segment is
    /// the base name; every other segment must be `key:value` with a non-empty key and value,
    /// otherwise it is ignored. Later duplicates of a key win.
    ///
    /// Returns `None` if `name` is not external or has no base name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let rest = name.strip_prefix(EXTERNAL_CONDITION_PREFIX)?;
        let mut segments = rest.split(SEGMENT_SEPARATOR).filter(|segment| !segment.is_empty());
        let base = segments.next()?;

        let parameters = segments
            .filter_map(|segment| {
                let parts: Vec<&str> = segment.split(PARAMETER_SEPARATOR).filter(|part| !part.is_empty()).collect();
                match parts.as_slice() {
                    [key, value] => Some(((*key).to_string(), (*value).to_string())),
                    _ => None,
                }
            })
            .collect();

        Some(Self {
            name: base.to_string(),
            parameters,
        })
    }
}

/// Everything an external resolver gets to see about one condition
#[derive(Debug, Clone, Copy)]
pub struct ExternalConditionRequest<'a> {
    /// Base name of the condition, without prefix and parameters
    pub condition: &'a str,
    pub parameters: &'a BTreeMap<String, String>,
    pub rule_id: &'a str,

    /// The rule's raw certificate type filter
    pub rule_certificate_type: Option<&'a str>,
    pub region: &'a str,

    /// The profile the caller asked for, even while a delegated profile is evaluated
    pub profile: &'a str,

    /// Caller-defined certificate object passed through untouched
    pub original: Option<&'a (dyn Any + Send + Sync)>,
}

/// Resolves `ext.` conditions on behalf of the validator
///
/// Returns `Some(true)` for fulfilled, `Some(false)` for violated, and `None` when the
/// condition cannot be decided; undecided conditions fall back to the configured
/// [`ExternalConditionStrategy`](crate::ExternalConditionStrategy).
pub trait ExternalConditionResolver: Send + Sync {
    fn resolve(&self, request: &ExternalConditionRequest<'_>) -> Option<bool>;
}

impl<F> ExternalConditionResolver for F
where
    F: Fn(&ExternalConditionRequest<'_>) -> Option<bool> + Send + Sync,
{
    fn resolve(&self, request: &ExternalConditionRequest<'_>) -> Option<bool> {
        self(request)
    }
}

/// Returns a normalized identifier used to tell whether certificates likely belong to the same person.
///
/// Family and given name are lowercased and clipped at their first non-letter character, so
/// `"Max-Peter"` and `"Max"` compare equal. Missing parts become empty strings. Callers should
/// prefer the transliterated name fields of a certificate.
#[must_use]
pub fn person_grouping_identifier(family_name: Option<&str>, given_name: Option<&str>, date_of_birth: Option<&str>) -> String {
    format!(
        "{}_{}_{}",
        normalize_name(family_name),
        normalize_name(given_name),
        date_of_birth.unwrap_or_default()
    )
}

fn normalize_name(name: Option<&str>) -> String {
    name.unwrap_or_default()
        .to_lowercase()
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_is_external() {
        assert!(ExternalCondition::is_external("ext.hasSomething"));
        assert!(ExternalCondition::is_external("ext."));
        assert!(!ExternalCondition::is_external("hasSomething"));
        assert!(!ExternalCondition::is_external("EXT.hasSomething"));
    }

    #[test]
    fn test_parse_without_parameters() {
        let parsed = ExternalCondition::parse("ext.hasValidVaccinationCertificateForPerson").unwrap();
        assert_eq!(parsed.name, "hasValidVaccinationCertificateForPerson");
        assert!(parsed.parameters.is_empty());
    }

    #[test]
    fn test_parse_with_parameters() {
        let parsed = ExternalCondition::parse("ext.hasValidVaccinationCertificateForPerson__parameterX:valueX").unwrap();
        assert_eq!(parsed.name, "hasValidVaccinationCertificateForPerson");
        assert_eq!(parsed.parameters, params(&[("parameterX", "valueX")]));

        let parsed = ExternalCondition::parse("ext.cond__a:1__b:2").unwrap();
        assert_eq!(parsed.parameters, params(&[("a", "1"), ("b", "2")]));
    }

    #[test]
    fn test_parse_drops_malformed_parameters() {
        let parsed = ExternalCondition::parse("ext.cond__noColon__a:b:c__:value__key:__ok:yes").unwrap();
        assert_eq!(parsed.name, "cond");
        assert_eq!(parsed.parameters, params(&[("ok", "yes")]));
    }

    #[test]
    fn test_parse_collapses_empty_pieces() {
        let parsed = ExternalCondition::parse("ext.____cond____a::b__").unwrap();
        assert_eq!(parsed.name, "cond");
        assert_eq!(parsed.parameters, params(&[("a", "b")]));

        let parsed = ExternalCondition::parse("ext.cond_").unwrap();
        assert_eq!(parsed.name, "cond_");
    }

    #[test]
    fn test_parse_later_parameter_wins() {
        let parsed = ExternalCondition::parse("ext.cond__a:1__a:2").unwrap();
        assert_eq!(parsed.parameters, params(&[("a", "2")]));
    }

    #[test]
    fn test_parse_without_base_name() {
        assert!(ExternalCondition::parse("ext.").is_none());
        assert!(ExternalCondition::parse("ext.____").is_none());
        assert!(ExternalCondition::parse("isFullVaccination").is_none());
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |request: &ExternalConditionRequest<'_>| Some(request.parameters.contains_key("ok"));
        let parameters = params(&[("ok", "1")]);
        let request = ExternalConditionRequest {
            condition: "cond",
            parameters: &parameters,
            rule_id: "R1",
            rule_certificate_type: None,
            region: "W",
            profile: "Entry",
            original: None,
        };
        assert_eq!(resolver.resolve(&request), Some(true));
    }

    #[test]
    fn test_person_grouping_identifier() {
        assert_eq!(
            person_grouping_identifier(Some("Mustermann"), Some("Max-Peter"), Some("1980-01-01")),
            "mustermann_max_1980-01-01"
        );
        assert_eq!(
            person_grouping_identifier(Some("MUSTERMANN<GABLER"), Some("ERIKA DOROTHEA"), Some("1964-08-12")),
            "mustermann_erika_1964-08-12"
        );
        assert_eq!(person_grouping_identifier(None, Some("Max"), None), "_max_");
        assert_eq!(person_grouping_identifier(Some(""), Some(""), Some("")), "__");
    }
}
