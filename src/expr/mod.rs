//! Defines the expression tree that macros are compiled from and matched against.
//!
//! An expression is the "skeleton" of a computation: datasets feeding named operators.
//! It does not execute anything; it only carries structure, parameters, and a canonical
//! text form (see `render` and `parser`).
pub mod error;
pub mod parser;
pub mod render;

use std::collections::BTreeMap;

pub use error::ExprError;
pub use parser::{is_identifier, parse, Parser};

/// The reserved identifier that stands for `Expr::Dummy` in canonical text.
pub const PLACEHOLDER: &str = "ARG";

/// A reference to an external data source. Opaque for matching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetRef {
    pub name: String,
}

/// A literal operator parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self { ParamValue::Str(s.to_string()) }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self { ParamValue::Str(s) }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self { ParamValue::Int(v) }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self { ParamValue::Float(v) }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self { ParamValue::Bool(v) }
}

/// An operator applied, with parameters, to an ordered list of operands.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub op: String,
    /// Script backing the operator, for script-driven operators.
    pub script: Option<String>,
    // Order is significant: it defines the canonical argument order of templates.
    pub operands: Vec<Expr>,
    pub params: BTreeMap<String, ParamValue>,
}

/// Selects one named output of a multi-output operator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptChildSelector {
    parent: Box<Expr>,
    selector: String,
}

impl ScriptChildSelector {
    /// Builds a selector. The parent must be an `Operator` or a `Dummy`.
    pub fn new(parent: Expr, selector: impl Into<String>) -> Result<Self, ExprError> {
        match parent {
            Expr::Operator(_) | Expr::Dummy => Ok(Self {
                parent: Box::new(parent),
                selector: selector.into(),
            }),
            other => Err(ExprError::InvalidSelectorParent { parent: other.to_string() }),
        }
    }

    pub fn parent(&self) -> &Expr { &self.parent }
    pub fn selector(&self) -> &str { &self.selector }
}

/// The closed set of expression node kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Dataset(DatasetRef),
    /// An argument hole. Only meaningful inside a template.
    Dummy,
    Operator(OperatorNode),
    ScriptChild(ScriptChildSelector),
}

impl Expr {
    pub fn dataset(name: impl Into<String>) -> Self {
        Expr::Dataset(DatasetRef { name: name.into() })
    }

    /// Builds an operator node without parameters or script.
    pub fn operator(op: impl Into<String>, operands: Vec<Expr>) -> Self {
        Expr::Operator(OperatorNode {
            op: op.into(),
            script: None,
            operands,
            params: BTreeMap::new(),
        })
    }

    /// Adds (or replaces) a parameter on an operator node. Other node kinds are returned unchanged.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        if let Expr::Operator(node) = &mut self {
            node.params.insert(key.into(), value.into());
        }
        self
    }

    /// Sets the script reference on an operator node. Other node kinds are returned unchanged.
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        if let Expr::Operator(node) = &mut self {
            node.script = Some(script.into());
        }
        self
    }

    pub fn select(self, selector: impl Into<String>) -> Result<Self, ExprError> {
        ScriptChildSelector::new(self, selector).map(Expr::ScriptChild)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Expr::Dataset(_) | Expr::Dummy)
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, Expr::Dummy)
    }

    /// Direct children in canonical order: operands, or the selector's parent.
    pub fn children(&self) -> &[Expr] {
        match self {
            Expr::Operator(node) => &node.operands,
            Expr::ScriptChild(sel) => std::slice::from_ref(sel.parent.as_ref()),
            Expr::Dataset(_) | Expr::Dummy => &[],
        }
    }

    /// Number of `Dummy` leaves, i.e. the arity of a template.
    pub fn arity(&self) -> usize {
        self.nodes().filter(|n| n.is_dummy()).count()
    }

    /// True if any `Dataset` leaf appears in the tree.
    pub fn contains_dataset(&self) -> bool {
        self.nodes().any(|n| matches!(n, Expr::Dataset(_)))
    }

    /// Leaves in canonical (depth-first, left-to-right) order.
    pub fn leaves(&self) -> impl Iterator<Item = &Expr> {
        self.nodes().filter(|n| n.is_leaf())
    }

    /// Pre-order traversal. Iterative, so deep trees cannot overflow the stack.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }

    /// Height of the tree (a leaf has depth 1). Iterative for the same reason as `nodes`.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            for child in node.children() {
                stack.push((child, level + 1));
            }
        }
        max
    }
}

/// Pre-order iterator over an expression tree.
pub struct Nodes<'a> {
    stack: Vec<&'a Expr>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push in reverse so the leftmost child is visited first.
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}
