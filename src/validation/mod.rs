//! Certificate validation
//!
//! [`Validator::evaluate`] scans the rules of a document in order and uses the first rule
//! that passes all of these gates:
//!
//! 1. The rule's schema version is supported.
//! 2. The validation clock lies within the rule's validity window.
//! 3. The region is included (directly or through `"all"`) and not excluded.
//! 4. The rule's certificate type, when set, matches the certificate.
//! 5. The rule's certificate-type conditions are all fulfilled.
//!
//! The selected rule's general conditions then decide between an error (a condition could
//! not be evaluated), an invalid result (a condition is violated), or continuing with the
//! profile's rule-set. Rule-sets may be selected by target group, may declare the
//! certificate invalid outright, may be guarded by conditions, or may reuse the result of
//! another profile.

mod certificate;
mod dispatcher;
mod outcome;
mod result;
mod times;
mod validator;

pub use crate::model::CertificateType;
pub use certificate::Certificate;
pub use outcome::{ConditionOutcome, GroupOutcome};
pub use result::{ConditionViolation, LinkedConditionResult, ValidProfileResult, ValidationResult, ValidityTimeResult};
pub use validator::Validator;
