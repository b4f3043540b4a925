//! Condition expressions using CEL
//!
//! Rule documents carry their condition logic as opaque expression strings. This module
//! compiles them with the CEL (Common Expression Language) interpreter and evaluates them
//! against an [`EvaluationContext`] built from the certificate payload and the verifier's
//! [`ExternalParameters`].
//!
//! Condition `logic` must be written in CEL. Documents whose conditions are authored in
//! another expression language (JsonLogic, for instance) still load, but every internal
//! condition then evaluates as failed.
//!
//! The rest of the crate never inspects expression syntax: an expression either yields a
//! boolean or it is indeterminate (`None`), which covers parse errors, runtime errors, and
//! non-boolean results alike.
//!
//! Expressions see two variables:
//!
//! - `external`: `validationClock`, `valueSets`, `issuerCountryCode`, `exp`, `iat`
//! - `payload`: the raw certificate payload

mod context;
mod expression;

pub use context::{EvaluationContext, ExternalParameters};
pub use expression::Expression;
