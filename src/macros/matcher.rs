//! matcher.rs
//! Structural matching of a template against a candidate expression.

use crate::expr::Expr;
use smallvec::SmallVec;

/// Sub-expressions bound to a template's placeholders, in canonical order.
pub type Bindings = SmallVec<[Expr; 4]>;

/// Outcome of a match. `Match` with no bindings is a real match (a template without
/// placeholders) and is distinct from `NoMatch`.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    NoMatch,
    Match(Bindings),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Match(_))
    }

    pub fn into_bindings(self) -> Option<Bindings> {
        match self {
            MatchResult::Match(bindings) => Some(bindings),
            MatchResult::NoMatch => None,
        }
    }
}

/// Tests whether `candidate` is an instance of `template`.
///
/// A bare `Dummy` template never matches at the top level; placeholders only bind
/// in operand (or selector-parent) position.
pub fn match_template(template: &Expr, candidate: &Expr) -> MatchResult {
    let mut bindings = Bindings::new();
    if match_node(template, candidate, &mut bindings) {
        MatchResult::Match(bindings)
    } else {
        MatchResult::NoMatch
    }
}

fn match_node(template: &Expr, candidate: &Expr, bindings: &mut Bindings) -> bool {
    match (template, candidate) {
        (Expr::Operator(t), Expr::Operator(c)) => {
            if t.op != c.op
                || t.script != c.script
                || t.params != c.params
                || t.operands.len() != c.operands.len()
            {
                return false;
            }
            t.operands
                .iter()
                .zip(&c.operands)
                .all(|(t_op, c_op)| match_operand(t_op, c_op, bindings))
        }
        (Expr::ScriptChild(t), Expr::ScriptChild(c)) => {
            t.selector() == c.selector() && match_operand(t.parent(), c.parent(), bindings)
        }
        // Datasets never match directly; a placeholder at the top never matches either.
        _ => false,
    }
}

fn match_operand(template: &Expr, candidate: &Expr, bindings: &mut Bindings) -> bool {
    if template.is_dummy() {
        bindings.push(candidate.clone());
        true
    } else {
        match_node(template, candidate, bindings)
    }
}
