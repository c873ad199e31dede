//! Defines the error types for macro definition, invocation, and persistence.
use crate::expr::ExprError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MacroError {
    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("Macro '{name}' expects {expected} argument(s), but only {supplied} were supplied")]
    ArgumentCountTooFew { name: String, expected: usize, supplied: usize },
    #[error("Macro '{name}' expects {expected} argument(s), but {supplied} were supplied")]
    ArgumentCountTooMany { name: String, expected: usize, supplied: usize },
    #[error("Malformed template: {0}")]
    MalformedTemplate(String),
    #[error("No macro named '{0}' is registered")]
    UnknownMacro(String),
    #[error("Expression nesting exceeds the limit of {limit}")]
    TooDeep { limit: usize },
    #[error("Could not read macro store {path:?}: {reason}")]
    PersistenceRead { path: PathBuf, reason: String },
    #[error("Could not write macro store {path:?}")]
    PersistenceWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Expr(#[from] ExprError),
}

impl MacroError {
    /// Attaches the macro name to an arity error raised by an anonymous instantiation.
    pub fn for_macro(self, macro_name: &str) -> Self {
        match self {
            MacroError::ArgumentCountTooFew { expected, supplied, .. } => MacroError::ArgumentCountTooFew {
                name: macro_name.to_string(),
                expected,
                supplied,
            },
            MacroError::ArgumentCountTooMany { expected, supplied, .. } => MacroError::ArgumentCountTooMany {
                name: macro_name.to_string(),
                expected,
                supplied,
            },
            other => other,
        }
    }
}
