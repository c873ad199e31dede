//! rewrite.rs
//! Replaces subtrees that match registered macros with macro calls.
//!
//! The search is outermost-first: a macro matching a node wins over any macro that
//! would match inside it. Among macros matching the same node, the first one
//! registered wins. No attempt is made to find the most compact rewrite.

use crate::error::MacroError;
use crate::expr::{Expr, OperatorNode, Parser, ScriptChildSelector};
use crate::macros::matcher::{match_template, MatchResult};
use crate::store::Registry;
use tracing::trace;

/// Rewrites canonical text, returning canonical text.
///
/// With `include_top` false the whole expression is never replaced, only its children.
pub fn rewrite(registry: &Registry, text: &str, include_top: bool, parser: &Parser) -> Result<String, MacroError> {
    let expr = parser.parse(text)?;
    Ok(rewrite_expr(registry, &expr, include_top)?.to_string())
}

/// Tree form of `rewrite`.
pub fn rewrite_expr(registry: &Registry, expr: &Expr, include_top: bool) -> Result<Expr, MacroError> {
    Rewriter { registry }.rewrite(expr, include_top)
}

struct Rewriter<'a> {
    registry: &'a Registry,
}

impl<'a> Rewriter<'a> {
    fn rewrite(&self, expr: &Expr, include_top: bool) -> Result<Expr, MacroError> {
        if expr.is_leaf() {
            return Ok(expr.clone());
        }

        if include_top {
            if let Some(call) = self.substitute(expr)? {
                return Ok(call);
            }
        }

        match expr {
            Expr::Operator(node) => {
                let operands = node
                    .operands
                    .iter()
                    .map(|operand| self.rewrite(operand, true))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Operator(OperatorNode {
                    op: node.op.clone(),
                    script: node.script.clone(),
                    operands,
                    params: node.params.clone(),
                }))
            }
            Expr::ScriptChild(sel) => {
                let parent = self.rewrite(sel.parent(), true)?;
                Ok(Expr::ScriptChild(ScriptChildSelector::new(parent, sel.selector())?))
            }
            Expr::Dataset(_) | Expr::Dummy => Ok(expr.clone()),
        }
    }

    /// Tries every macro, in registration order, against `expr` itself.
    fn substitute(&self, expr: &Expr) -> Result<Option<Expr>, MacroError> {
        for mac in self.registry.iter() {
            if let MatchResult::Match(bindings) = match_template(&mac.template, expr) {
                trace!(macro_name = %mac.name, arity = bindings.len(), "substituting macro call");
                let args = bindings
                    .iter()
                    .map(|bound| self.rewrite(bound, true))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Some(Expr::operator(mac.name.clone(), args)));
            }
        }
        Ok(None)
    }
}
