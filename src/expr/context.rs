//! The data an expression is evaluated against

use crate::calendar::parse_instant;
use crate::model::ValueSets;
use cel_interpreter::objects::Map;
use cel_interpreter::{Context, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Values supplied by the verifier rather than read from the certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalParameters {
    pub validation_clock: DateTime<Utc>,
    pub value_sets: ValueSets,
    pub issuer_country_code: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
}

impl ExternalParameters {
    #[must_use]
    pub fn new(validation_clock: DateTime<Utc>) -> Self {
        Self {
            validation_clock,
            value_sets: ValueSets::new(),
            issuer_country_code: String::new(),
            expires_at: None,
            issued_at: None,
        }
    }

    fn to_json(&self) -> JsonValue {
        let mut external = serde_json::Map::new();
        let _ = external.insert("validationClock".into(), JsonValue::String(format_instant(self.validation_clock)));
        let value_sets = self
            .value_sets
            .iter()
            .map(|(name, values)| (name.clone(), JsonValue::from(values.clone())))
            .collect::<serde_json::Map<_, _>>();
        let _ = external.insert("valueSets".into(), JsonValue::Object(value_sets));
        let _ = external.insert("issuerCountryCode".into(), JsonValue::String(self.issuer_country_code.clone()));
        if let Some(exp) = self.expires_at {
            let _ = external.insert("exp".into(), JsonValue::String(format_instant(exp)));
        }
        if let Some(iat) = self.issued_at {
            let _ = external.insert("iat".into(), JsonValue::String(format_instant(iat)));
        }
        JsonValue::Object(external)
    }

    fn to_cel(&self) -> Value {
        let mut external: HashMap<Arc<String>, Value> = HashMap::new();
        let _ = external.insert(key("validationClock"), Value::Timestamp(self.validation_clock.fixed_offset()));

        let value_sets: HashMap<Arc<String>, Value> = self
            .value_sets
            .iter()
            .map(|(name, values)| {
                let list = values.iter().map(|v| Value::String(Arc::new(v.clone()))).collect();
                (Arc::new(name.clone()), Value::List(Arc::new(list)))
            })
            .collect();
        let _ = external.insert(key("valueSets"), Value::Map(Map::from(value_sets)));
        let _ = external.insert(key("issuerCountryCode"), Value::String(Arc::new(self.issuer_country_code.clone())));
        if let Some(exp) = self.expires_at {
            let _ = external.insert(key("exp"), Value::Timestamp(exp.fixed_offset()));
        }
        if let Some(iat) = self.issued_at {
            let _ = external.insert(key("iat"), Value::Timestamp(iat.fixed_offset()));
        }
        Value::Map(Map::from(external))
    }
}

/// The evaluation context of one certificate
///
/// Holds the same data twice: as a JSON tree `{"external": ..., "payload": ...}` used for
/// placeholder lookups, and as a CEL context exposing the variables `external` and `payload`.
/// Built once per evaluation and shared by every condition of that evaluation.
pub struct EvaluationContext {
    json: JsonValue,
    cel: Context<'static>,
}

impl EvaluationContext {
    #[must_use]
    pub fn new(payload: &JsonValue, external: &ExternalParameters) -> Self {
        let mut cel = Context::default();
        cel.add_variable_from_value("external", external.to_cel());
        cel.add_variable_from_value("payload", convert_json_value(payload));

        let mut json = serde_json::Map::new();
        let _ = json.insert("external".into(), external.to_json());
        let _ = json.insert("payload".into(), payload.clone());

        Self {
            json: JsonValue::Object(json),
            cel,
        }
    }

    #[must_use]
    pub const fn json(&self) -> &JsonValue {
        &self.json
    }

    #[must_use]
    pub const fn cel(&self) -> &Context<'static> {
        &self.cel
    }

    /// Walks a dot-separated path (`payload.v.0.dt`) through the JSON tree.
    ///
    /// Numeric segments index into arrays when in range; empty segments are ignored.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&JsonValue> {
        path.split('.').filter(|segment| !segment.is_empty()).try_fold(&self.json, |node, segment| match node {
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|index| items.get(index)),
            _ => node.get(segment),
        })
    }

    /// Resolves a path to an instant; the referenced value must be an ISO-8601 date-time or date string.
    #[must_use]
    pub fn lookup_instant(&self, path: &str) -> Option<DateTime<Utc>> {
        self.lookup(path).and_then(JsonValue::as_str).and_then(parse_instant)
    }

    /// Replaces every `#path#` placeholder in `text` with the referenced value.
    ///
    /// Strings are inserted verbatim and numbers in decimal, except the verifier-supplied
    /// instants (`external.validationClock`, `external.exp`, `external.iat`), which are
    /// rendered as `dd.MM.yyyy`. Placeholders that resolve to anything else, or to nothing,
    /// are removed.
    #[must_use]
    pub fn interpolate(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;

        while let Some((before, after_open)) = rest.split_once('#') {
            result.push_str(before);
            let Some((path, after_close)) = after_open.split_once('#') else {
                result.push('#');
                result.push_str(after_open);
                return result;
            };

            match self.lookup(path) {
                Some(JsonValue::String(s)) if is_external_instant(path) => match parse_instant(s) {
                    Some(instant) => result.push_str(&instant.format(SHORT_DATE_FORMAT).to_string()),
                    None => result.push_str(s),
                },
                Some(JsonValue::String(s)) => result.push_str(s),
                Some(JsonValue::Number(n)) => result.push_str(&n.to_string()),
                _ => {}
            }
            rest = after_close;
        }

        result.push_str(rest);
        result
    }
}

impl core::fmt::Debug for EvaluationContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EvaluationContext").field("json", &self.json).finish_non_exhaustive()
    }
}

const EXTERNAL_INSTANTS: [&str; 3] = ["validationClock", "exp", "iat"];
const SHORT_DATE_FORMAT: &str = "%d.%m.%Y";

fn is_external_instant(path: &str) -> bool {
    let mut segments = path.split('.').filter(|segment| !segment.is_empty());
    segments.next() == Some("external")
        && segments.next().is_some_and(|name| EXTERNAL_INSTANTS.contains(&name))
        && segments.next().is_none()
}

fn key(name: &str) -> Arc<String> {
    Arc::new(name.to_string())
}

fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Convert a JSON value to a CEL value
fn convert_json_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => n
            .as_i64()
            .map(Value::Int)
            .or_else(|| n.as_u64().map(Value::UInt))
            .or_else(|| n.as_f64().map(Value::Float))
            .unwrap_or(Value::Null),
        JsonValue::String(s) => Value::String(Arc::new(s.clone())),
        JsonValue::Array(items) => Value::List(Arc::new(items.iter().map(convert_json_value).collect())),
        JsonValue::Object(fields) => {
            let fields: HashMap<Arc<String>, Value> = fields.iter().map(|(k, v)| (Arc::new(k.clone()), convert_json_value(v))).collect();
            Value::Map(Map::from(fields))
        }
    }
}
