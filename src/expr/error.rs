//! Defines the error types for the expression module.
use thiserror::Error;

/// Why a piece of canonical text was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxReason {
    Unexpected,
    DatasetSelector,
    DuplicateParam,
    TrailingInput,
}

impl std::fmt::Display for SyntaxReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            SyntaxReason::Unexpected => "unexpected input",
            SyntaxReason::DatasetSelector => "a dataset cannot carry an output selector",
            SyntaxReason::DuplicateParam => "duplicate parameter name",
            SyntaxReason::TrailingInput => "trailing input after expression",
        };
        f.write_str(msg)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    #[error("Syntax error at byte {offset}: {reason}")]
    Syntax { offset: usize, reason: SyntaxReason },
    #[error("Expression nesting exceeds the limit of {limit}")]
    TooDeep { limit: usize },
    #[error("Selector parent must be an operator or a placeholder, got '{parent}'")]
    InvalidSelectorParent { parent: String },
}
