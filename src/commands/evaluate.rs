use super::Host;
use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::calendar::parse_instant;
use crate::config::EngineConfig;
use crate::external::ExternalConditionRequest;
use crate::model::{CertificateType, RuleDocument, ValueSets, load_value_sets};
use crate::validation::{Certificate, Validator};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use clap::Parser;
use ohno::{IntoAppError, app_err};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "  evaluate";

#[derive(Parser, Debug)]
pub struct EvaluateArgs {
    /// Rule document (JSON)
    #[arg(long, value_name = "PATH")]
    pub rules: Utf8PathBuf,

    /// Decoded certificate payload (JSON)
    #[arg(long, value_name = "PATH")]
    pub certificate: Utf8PathBuf,

    /// Kind of certificate: vaccination, test, recovery, or vaccinationExemption
    #[arg(long = "type", value_name = "TYPE", value_parser = parse_certificate_type)]
    pub certificate_type: CertificateType,

    /// Region to validate for
    #[arg(long, value_name = "REGION")]
    pub region: String,

    /// Profile to validate for; repeat for several profiles [default: every profile of the document]
    #[arg(long = "profile", value_name = "PROFILE")]
    pub profiles: Vec<String>,

    /// Value sets (JSON object of string arrays)
    #[arg(long, value_name = "PATH")]
    pub value_sets: Option<Utf8PathBuf>,

    /// Validation clock as an RFC 3339 instant [default: now]
    #[arg(long, value_name = "INSTANT")]
    pub clock: Option<String>,

    /// Country code of the certificate issuer
    #[arg(long, value_name = "CODE", default_value = "")]
    pub issuer_country: String,

    /// Issuance instant of the certificate
    #[arg(long, value_name = "INSTANT")]
    pub issued_at: Option<String>,

    /// Expiry instant of the certificate
    #[arg(long, value_name = "INSTANT")]
    pub expires_at: Option<String>,

    /// Answer for an external condition, by base name; repeat for several conditions
    #[arg(long = "external", value_name = "NAME=BOOL", value_parser = parse_external_answer)]
    pub external: Vec<(String, bool)>,

    /// Path to configuration file (default is `cert-rules.toml` in the current directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

pub fn evaluate_certificate<H: Host>(host: &mut H, args: &EvaluateArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = EngineConfig::load(Utf8Path::new("."), args.config.as_ref())?;
    let document = RuleDocument::load(&args.rules)?;
    let value_sets = args.value_sets.as_deref().map_or_else(|| Ok(ValueSets::new()), load_value_sets)?;
    let certificate = load_certificate(args)?;
    let clock = args.clock.as_deref().map_or_else(|| Ok(Utc::now()), |clock| instant_arg("--clock", clock))?;

    log::info!(target: LOG_TARGET, "Validating '{}' at {clock} in region '{}'", args.certificate, args.region);

    let answers: BTreeMap<&str, bool> = args.external.iter().map(|(name, answer)| (name.as_str(), *answer)).collect();
    let resolver = |request: &ExternalConditionRequest<'_>| answers.get(request.condition).copied();

    let validator = Validator::new(&document, &value_sets, clock).with_config(config).with_resolver(&resolver);
    let profiles: Vec<&str> = args.profiles.iter().map(String::as_str).collect();
    let results = validator.evaluate_all(&certificate, &args.region, (!profiles.is_empty()).then_some(profiles.as_slice()));

    let json = serde_json::to_string_pretty(&results).into_app_err("serializing validation results")?;
    let _ = writeln!(host.output(), "{json}");
    Ok(())
}

fn load_certificate(args: &EvaluateArgs) -> Result<Certificate> {
    let text = fs::read_to_string(&args.certificate).into_app_err_with(|| format!("reading certificate '{}'", args.certificate))?;
    let payload: serde_json::Value = serde_json::from_str(&text).into_app_err_with(|| format!("parsing certificate '{}'", args.certificate))?;

    let mut certificate = Certificate::new(args.certificate_type, payload).with_issuer_country_code(args.issuer_country.as_str());
    if let Some(issued_at) = &args.issued_at {
        certificate = certificate.with_issued_at(instant_arg("--issued-at", issued_at)?);
    }
    if let Some(expires_at) = &args.expires_at {
        certificate = certificate.with_expires_at(instant_arg("--expires-at", expires_at)?);
    }

    Ok(certificate)
}

fn instant_arg(name: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_instant(value).ok_or_else(|| app_err!("{name} expects an RFC 3339 instant or a YYYY-MM-DD date, got '{value}'"))
}

fn parse_certificate_type(text: &str) -> core::result::Result<CertificateType, String> {
    text.parse().map_err(|e| format!("unknown certificate type '{text}' ({e:?})"))
}

fn parse_external_answer(text: &str) -> core::result::Result<(String, bool), String> {
    let (name, answer) = text.split_once('=').ok_or_else(|| format!("expected NAME=BOOL, got '{text}'"))?;
    let answer = answer.parse().map_err(|e| format!("expected true or false after '=' ({e})"))?;
    Ok((name.to_string(), answer))
}
