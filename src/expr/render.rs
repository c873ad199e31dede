//! render.rs
//! Canonical text rendering. `parser::parse` is the exact inverse of these `Display` impls.
//!
//! Operands come first in their original order, then parameters sorted by name:
//! `op@"script"(operand, ..., key=value, ...)`, and selectors are written as `parent["name"]`.

use super::{Expr, OperatorNode, ParamValue, PLACEHOLDER};
use std::fmt::{self, Display, Formatter, Write};

pub(crate) fn write_quoted(f: &mut impl Write, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            other => f.write_char(other)?,
        }
    }
    f.write_char('"')
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write_quoted(f, s),
            ParamValue::Int(v) => write!(f, "{}", v),
            // Debug keeps a '.' or exponent, so the value reparses as a float.
            // Non-finite values have no canonical spelling and will not reparse.
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl Display for OperatorNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.op)?;
        if let Some(script) = &self.script {
            f.write_char('@')?;
            write_quoted(f, script)?;
        }
        f.write_char('(')?;
        let mut first = true;
        for operand in &self.operands {
            if !first { f.write_str(", ")?; }
            first = false;
            write!(f, "{}", operand)?;
        }
        for (key, value) in &self.params {
            if !first { f.write_str(", ")?; }
            first = false;
            write!(f, "{}={}", key, value)?;
        }
        f.write_char(')')
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Dataset(ds) => f.write_str(&ds.name),
            Expr::Dummy => f.write_str(PLACEHOLDER),
            Expr::Operator(node) => write!(f, "{}", node),
            Expr::ScriptChild(sel) => {
                write!(f, "{}[", sel.parent())?;
                write_quoted(f, sel.selector())?;
                f.write_char(']')
            }
        }
    }
}
