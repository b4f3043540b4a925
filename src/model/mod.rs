//! Rule document entities and their JSON wire format
//!
//! A [`RuleDocument`] bundles the usage profiles, the named condition library, and the
//! ordered list of [`BusinessRule`]s of one jurisdiction. Documents are loaded once and
//! are immutable afterwards; the validator only borrows them.
//!
//! Object-valued fields whose order matters for evaluation (profiles of a rule, target
//! groups, group keys of a profile) are loaded into an [`OrderedMap`] that keeps the
//! document order.

mod condition;
mod localized;
mod ordered_map;
mod rule;
mod rule_set;
mod validity_time;

use crate::Result;
use camino::Utf8Path;
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

pub use condition::{AndConditionGroup, Condition, LinkedCondition, OrConditionGroup};
pub use localized::LocalizedText;
pub use ordered_map::OrderedMap;
pub use rule::{ALL_GROUPS, ALL_REGIONS, BusinessRule, CertificateType, ProfileRuleSet, RegionCondition};
pub use rule_set::{ConditionalRuleSet, DelegatingRuleSet, RuleSet};
pub use validity_time::{ValidityTime, ValidityTimeFormat};

/// Named lists of allowed codes (vaccines, test types, ...) exposed to expressions as `external.valueSets`
pub type ValueSets = BTreeMap<String, Vec<String>>;

/// A usage context such as "Entry" or "Club"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,

    #[serde(default)]
    pub name: LocalizedText,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<BTreeMap<String, String>>,
}

/// A complete set of profiles, conditions, and rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDocument {
    pub profiles: Vec<Profile>,
    pub conditions: BTreeMap<String, Condition>,
    pub rules: Vec<BusinessRule>,
}

impl RuleDocument {
    /// Parse a rule document from its JSON representation
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a well-formed rule document
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).into_app_err("parsing rule document")
    }

    /// Load a rule document from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading rule document '{path}'"))?;
        serde_json::from_str(&text).into_app_err_with(|| format!("parsing rule document '{path}'"))
    }

    #[must_use]
    pub fn profile(&self, id: &str) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    #[must_use]
    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    pub fn profile_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.iter().map(|profile| profile.id.as_str())
    }
}

/// Load value sets from a JSON object of string arrays
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed
pub fn load_value_sets(path: &Utf8Path) -> Result<ValueSets> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading value sets '{path}'"))?;
    serde_json::from_str(&text).into_app_err_with(|| format!("parsing value sets '{path}'"))
}
