#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Business-rule validation for health certificates
//!
//! This library interprets machine-readable rule documents against a presented certificate
//! (vaccination, test, recovery, or vaccination exemption) at a given validation clock and
//! decides, per usage profile, whether the certificate is valid and for which time window.
//!
//! Condition logic is evaluated as CEL (see [`expr`]). Rule documents whose conditions use
//! JsonLogic load without error, but none of their internal conditions can be evaluated.
//!
//! # Module Organization
//!
//! - [`model`]: Rule document entities and their JSON wire format
//! - [`expr`]: CEL-backed condition expressions and the evaluation context
//! - [`calendar`]: Date arithmetic used by validity times
//! - [`external`]: Externally resolved conditions (`ext.` prefix)
//! - [`validation`]: Rule selection, rule-set resolution and result assembly
//! - [`lint`]: Static cross-reference checks for rule documents
//! - [`config`]: Engine settings loaded from TOML
//! - [`commands`]: Command-line interface

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod calendar;
pub mod commands;
pub mod config;
pub mod expr;
pub mod external;
pub mod lint;
pub mod model;
pub mod validation;

pub use crate::commands::{Host, run};
pub use crate::config::{EngineConfig, ExternalConditionStrategy};
pub use crate::external::{ExternalCondition, ExternalConditionRequest, ExternalConditionResolver, person_grouping_identifier};
pub use crate::lint::SyntaxError;
pub use crate::model::{RuleDocument, ValueSets};
pub use crate::validation::{Certificate, CertificateType, ValidationResult, Validator};
