use super::{AndConditionGroup, OrConditionGroup, OrderedMap, RuleSet};
use crate::calendar::parse_instant;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Region key that matches every region in an include list
pub const ALL_REGIONS: &str = "all";

/// Group key of a rule-set that applies regardless of target group
pub const ALL_GROUPS: &str = "all";

/// The kind of certificate being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum CertificateType {
    Vaccination,
    Test,
    Recovery,
    VaccinationExemption,
}

/// Rule-sets of one profile keyed by target group id (or [`ALL_GROUPS`]), in document order
pub type ProfileRuleSet = OrderedMap<RuleSet>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCondition {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,
}

impl RegionCondition {
    /// A region applies when it is included (explicitly or through `"all"`) and not excluded.
    #[must_use]
    pub fn applies_to(&self, region: &str) -> bool {
        let included = self.include.iter().any(|r| r == region || r == ALL_REGIONS);
        included && !self.exclude.iter().any(|r| r == region)
    }
}

/// One versioned policy rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessRule {
    pub id: String,

    pub schema_version: u32,

    pub regions: RegionCondition,

    /// Raw certificate type filter; matched case-insensitively
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_type: Option<String>,

    #[serde(default)]
    pub certificate_type_conditions: AndConditionGroup,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub general_conditions: Option<AndConditionGroup>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<String>,

    pub profiles: OrderedMap<ProfileRuleSet>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<OrderedMap<OrConditionGroup>>,
}

impl BusinessRule {
    /// The certificate type this rule is restricted to.
    ///
    /// Returns `None` both when no filter is set and when the filter names an unknown type;
    /// either way the rule applies to every certificate type.
    #[must_use]
    pub fn certificate_type(&self) -> Option<CertificateType> {
        self.certificate_type.as_deref()?.parse().ok()
    }

    #[must_use]
    pub fn valid_from(&self) -> Option<DateTime<Utc>> {
        self.valid_from.as_deref().and_then(parse_instant)
    }

    #[must_use]
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.valid_until.as_deref().and_then(parse_instant)
    }

    /// Whether the rule is in force at `clock`; absent or unparseable bounds are open.
    #[must_use]
    pub fn is_in_force(&self, clock: DateTime<Utc>) -> bool {
        self.valid_from().is_none_or(|from| from <= clock) && self.valid_until().is_none_or(|until| clock < until)
    }

    #[must_use]
    pub const fn supports_schema_version(&self, supported: u32) -> bool {
        self.schema_version <= supported
    }

    /// Target groups of this rule, in document order; empty when the rule does not use them.
    #[must_use]
    pub fn target_groups(&self) -> Option<&OrderedMap<OrConditionGroup>> {
        self.groups.as_ref().filter(|groups| !groups.is_empty())
    }
}
