//! Lazily compiled boolean expressions

use super::EvaluationContext;
use cel_interpreter::{Program, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::{Arc, OnceLock};

const LOG_TARGET: &str = "      expr";

/// A condition expression in CEL syntax
///
/// The source text is kept verbatim; it is compiled the first time it is evaluated and the
/// compiled program (or the fact that compilation failed) is cached for every later use.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    program: OnceLock<Option<Arc<Program>>>,
}

impl Expression {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            program: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the compiled program, compiling it on first access.
    ///
    /// Returns `None` if the source is not a valid expression.
    #[must_use]
    pub fn program(&self) -> Option<&Program> {
        self.program
            .get_or_init(|| match Program::compile(&self.source) {
                Ok(program) => Some(Arc::new(program)),
                Err(e) => {
                    log::debug!(target: LOG_TARGET, "Could not parse expression '{}': {e}", self.source);
                    None
                }
            })
            .as_deref()
    }

    /// Evaluates the expression against `context`.
    ///
    /// Returns `None` when the expression cannot be compiled, fails at runtime, or yields a
    /// non-boolean value.
    #[must_use]
    pub fn evaluate(&self, context: &EvaluationContext) -> Option<bool> {
        let program = self.program()?;
        match program.execute(context.cel()) {
            Ok(Value::Bool(b)) => Some(b),
            Ok(other) => {
                log::debug!(target: LOG_TARGET, "Expression '{}' did not return a boolean, got '{other:?}' instead", self.source);
                None
            }
            Err(e) => {
                log::debug!(target: LOG_TARGET, "Could not evaluate expression '{}': {e}", self.source);
                None
            }
        }
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Expression {}

impl Serialize for Expression {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Expression {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::new)
    }
}
