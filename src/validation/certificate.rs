use crate::expr::ExternalParameters;
use crate::model::{CertificateType, ValueSets};
use chrono::{DateTime, Utc};
use core::any::Any;
use std::sync::Arc;

/// A certificate presented for validation
#[derive(Debug, Clone)]
pub struct Certificate {
    pub certificate_type: CertificateType,

    /// The decoded certificate content, exposed to expressions as `payload`
    pub payload: serde_json::Value,

    pub issuer_country_code: String,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,

    /// Caller-defined object handed to the external condition resolver untouched
    pub original: Option<Arc<dyn Any + Send + Sync>>,
}

impl Certificate {
    #[must_use]
    pub fn new(certificate_type: CertificateType, payload: serde_json::Value) -> Self {
        Self {
            certificate_type,
            payload,
            issuer_country_code: String::new(),
            issued_at: None,
            expires_at: None,
            original: None,
        }
    }

    #[must_use]
    pub fn with_issuer_country_code(mut self, code: impl Into<String>) -> Self {
        self.issuer_country_code = code.into();
        self
    }

    #[must_use]
    pub const fn with_issued_at(mut self, issued_at: DateTime<Utc>) -> Self {
        self.issued_at = Some(issued_at);
        self
    }

    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[must_use]
    pub fn with_original(mut self, original: Arc<dyn Any + Send + Sync>) -> Self {
        self.original = Some(original);
        self
    }

    /// The verifier-side values exposed to expressions as `external`.
    #[must_use]
    pub fn external_parameters(&self, value_sets: &ValueSets, validation_clock: DateTime<Utc>) -> ExternalParameters {
        ExternalParameters {
            validation_clock,
            value_sets: value_sets.clone(),
            issuer_country_code: self.issuer_country_code.clone(),
            expires_at: self.expires_at,
            issued_at: self.issued_at,
        }
    }
}
