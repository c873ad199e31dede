//! The macro engine: compile templates, match them, fill them, and rewrite with them.
pub mod compiler;
pub mod instantiate;
pub mod matcher;
pub mod rewrite;

pub use compiler::{compile, compile_str};
pub use instantiate::instantiate;
pub use matcher::{match_template, Bindings, MatchResult};
pub use rewrite::{rewrite, rewrite_expr};

use crate::error::MacroError;
use crate::expr::{is_identifier, Expr, Parser, PLACEHOLDER};

/// A named template.
#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    pub name: String,
    pub template: Expr,
}

impl Macro {
    /// Binds `template` to `name`.
    ///
    /// The name must be a plain identifier other than the placeholder token, and the
    /// template must be free of datasets and read back from its canonical text as itself.
    /// Anything else could not be saved, reloaded, or emitted by `rewrite` as a call.
    pub fn new(name: impl Into<String>, template: Expr) -> Result<Self, MacroError> {
        let name = name.into();
        if name == PLACEHOLDER || !is_identifier(&name) {
            return Err(MacroError::MalformedTemplate(format!("'{}' is not a valid macro name", name)));
        }
        if template.contains_dataset() {
            return Err(MacroError::MalformedTemplate(format!(
                "template '{}' still references a dataset",
                template
            )));
        }
        let rendered = template.to_string();
        match Parser::new(template.depth()).parse(&rendered) {
            Ok(reparsed) if reparsed == template => Ok(Self { name, template }),
            _ => Err(MacroError::MalformedTemplate(format!(
                "template '{}' has no canonical text form",
                rendered
            ))),
        }
    }

    pub fn arity(&self) -> usize {
        self.template.arity()
    }

    /// Canonical text of the template, with placeholders rendered as the reserved token.
    pub fn rendered(&self) -> String {
        self.template.to_string()
    }

    pub fn invoke(&self, args: impl IntoIterator<Item = Expr>) -> Result<Expr, MacroError> {
        instantiate(&self.template, args).map_err(|e| e.for_macro(&self.name))
    }
}
