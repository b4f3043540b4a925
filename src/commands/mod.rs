//! Command-line interface for cert-rules
//!
//! # Commands
//!
//! - **evaluate**: Load a rule document, value sets, and a certificate payload, validate the
//!   certificate for the requested profiles, and print the results as JSON
//! - **lint**: Report unresolved references in a rule document
//! - **init**: Generate a default configuration file
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. All output goes through a [`Host`], so commands can be
//! exercised in tests without touching the real terminal or process.

mod common;
mod evaluate;
mod host;
mod init;
mod lint;
mod run;

pub use evaluate::{EvaluateArgs, evaluate_certificate};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use lint::{LintArgs, lint_rules};
pub use run::run;
