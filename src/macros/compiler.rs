//! compiler.rs
//! Derives a template from a concrete expression by turning its data-bearing
//! positions into placeholders.

use crate::error::MacroError;
use crate::expr::{Expr, OperatorNode, Parser, ScriptChildSelector};
use std::collections::HashSet;
use tracing::debug;

/// Compiles `expr` into a template.
///
/// Datasets and existing placeholders always become `Dummy`. Any sub-expression whose
/// canonical text equals one of `explicit_params` becomes `Dummy` as well, even when it
/// is an operator. Everything else keeps its operator, script, and parameters.
pub fn compile(expr: &Expr, explicit_params: &[Expr]) -> Result<Expr, MacroError> {
    let rendered: HashSet<String> = explicit_params.iter().map(|p| p.to_string()).collect();
    let template = Compiler { explicit: &rendered }.rebuild(expr)?;
    debug!(template = %template, arity = template.arity(), "compiled template");
    Ok(template)
}

/// Text front-end for `compile`. Explicit parameters are given as canonical text too.
pub fn compile_str(text: &str, explicit_params: &[&str], parser: &Parser) -> Result<Expr, MacroError> {
    let expr = parser.parse(text)?;
    let params = explicit_params
        .iter()
        .map(|p| parser.parse(p))
        .collect::<Result<Vec<_>, _>>()?;
    compile(&expr, &params)
}

struct Compiler<'a> {
    explicit: &'a HashSet<String>,
}

impl<'a> Compiler<'a> {
    fn is_explicit(&self, expr: &Expr) -> bool {
        // Rendering every subtree is only worth it when there is something to compare against.
        !self.explicit.is_empty() && self.explicit.contains(&expr.to_string())
    }

    fn rebuild(&self, expr: &Expr) -> Result<Expr, MacroError> {
        if self.is_explicit(expr) {
            return Ok(Expr::Dummy);
        }

        match expr {
            Expr::Dataset(_) | Expr::Dummy => Ok(Expr::Dummy),
            Expr::Operator(node) => {
                let operands = node
                    .operands
                    .iter()
                    .map(|operand| self.rebuild(operand))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Operator(OperatorNode {
                    op: node.op.clone(),
                    script: node.script.clone(),
                    operands,
                    params: node.params.clone(),
                }))
            }
            Expr::ScriptChild(sel) => {
                let parent = self.rebuild(sel.parent())?;
                // Cannot fail: a rebuilt operator or placeholder is always a valid parent.
                ScriptChildSelector::new(parent, sel.selector())
                    .map(Expr::ScriptChild)
                    .map_err(|e| MacroError::UnsupportedExpression(e.to_string()))
            }
        }
    }
}
