use super::OrConditionGroup;
use crate::calendar::{DateModifier, TimeUnit, parse_instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a resolved validity time should be presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ValidityTimeFormat {
    Date,
    #[default]
    DateTime,
}

/// A candidate valid-from or valid-until instant
///
/// Fields are kept as authored; the typed accessors interpret them leniently so that an
/// unknown unit, modifier, or format never prevents a document from loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityTime {
    /// Literal ISO-8601 instant, or a `#path#` placeholder into the evaluation context
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<OrConditionGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_unit: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plus_interval: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

impl ValidityTime {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            conditions: None,
            plus_unit: None,
            plus_interval: None,
            modifier: None,
            format: None,
            max: None,
        }
    }

    /// The path inside a `#path#` placeholder, or `None` for a literal value.
    #[must_use]
    pub fn placeholder(&self) -> Option<&str> {
        self.value.strip_prefix('#')?.strip_suffix('#')
    }

    /// The offset to apply, present only when both unit and interval are known.
    #[must_use]
    pub fn offset(&self) -> Option<(TimeUnit, i64)> {
        let unit = self.plus_unit.as_deref()?.parse().ok()?;
        Some((unit, self.plus_interval?))
    }

    #[must_use]
    pub fn modifier(&self) -> Option<DateModifier> {
        self.modifier.as_deref()?.parse().ok()
    }

    #[must_use]
    pub fn format(&self) -> ValidityTimeFormat {
        self.format.as_deref().and_then(|format| format.parse().ok()).unwrap_or_default()
    }

    #[must_use]
    pub fn max(&self) -> Option<DateTime<Utc>> {
        self.max.as_deref().and_then(parse_instant)
    }

    /// The guarding OR-group, treating an empty list like an absent one.
    #[must_use]
    pub fn guard(&self) -> Option<&OrConditionGroup> {
        self.conditions.as_ref().filter(|conditions| !conditions.is_empty())
    }
}
