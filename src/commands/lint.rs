use super::Host;
use crate::Result;
use crate::model::RuleDocument;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct LintArgs {
    /// Rule document (JSON)
    #[arg(long, value_name = "PATH")]
    pub rules: Utf8PathBuf,
}

/// Reports every cross-reference problem of a rule document, exiting with status 1 if there is any
pub fn lint_rules<H: Host>(host: &mut H, args: &LintArgs) -> Result<()> {
    let document = match RuleDocument::load(&args.rules) {
        Ok(document) => document,
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Rule document could not be loaded: {e}");
            host.exit(1);
            return Err(e);
        }
    };

    let errors = document.lint();
    if errors.is_empty() {
        let _ = writeln!(host.output(), "Rule document is consistent");
        let _ = writeln!(
            host.output(),
            "{} profiles, {} conditions, {} rules",
            document.profiles.len(),
            document.conditions.len(),
            document.rules.len()
        );
        return Ok(());
    }

    for error in &errors {
        let _ = writeln!(host.output(), "{error}");
    }
    let _ = writeln!(host.error(), "❌ Found {} problem(s) in '{}'", errors.len(), args.rules);
    host.exit(1);
    Ok(())
}
