//! parser.rs
//! Nom parser for canonical expression text.
//!
//! Grammar (whitespace is allowed between tokens):
//!
//! ```text
//! expr     := primary selector?
//! primary  := call | ident              ; the placeholder ident becomes Expr::Dummy
//! call     := ident ('@' string)? '(' (arg (',' arg)*)? ')'
//! arg      := ident '=' value | expr
//! selector := '[' string ']'
//! value    := string | bool | float | int
//! ```

use super::error::{ExprError, SyntaxReason};
use super::{Expr, OperatorNode, ParamValue, ScriptChildSelector, PLACEHOLDER};
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{cut, map, map_res, opt, recognize, value},
    error::{ErrorKind, FromExternalError, ParseError},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use std::collections::BTreeMap;

/// Nesting limit applied when no explicit limit is configured.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultKind {
    Syntax(SyntaxReason),
    TooDeep,
}

/// Parser-internal error carrying the remaining input at the failure point.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Fault<'a> {
    input: &'a str,
    kind: FaultKind,
}

impl<'a> Fault<'a> {
    fn syntax(input: &'a str, reason: SyntaxReason) -> Self {
        Self { input, kind: FaultKind::Syntax(reason) }
    }

    fn into_error(self, text: &str, limit: usize) -> ExprError {
        match self.kind {
            FaultKind::TooDeep => ExprError::TooDeep { limit },
            FaultKind::Syntax(reason) => ExprError::Syntax {
                offset: text.len() - self.input.len(),
                reason,
            },
        }
    }
}

impl<'a> ParseError<&'a str> for Fault<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        Fault::syntax(input, SyntaxReason::Unexpected)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for Fault<'a> {
    fn from_external_error(input: &'a str, _kind: ErrorKind, _e: E) -> Self {
        Fault::syntax(input, SyntaxReason::Unexpected)
    }
}

type PResult<'a, T> = IResult<&'a str, T, Fault<'a>>;

/// One entry of an operator's argument list.
enum Arg {
    Operand(Expr),
    Param(String, ParamValue),
}

/// Parses canonical text with the default nesting limit.
pub fn parse(text: &str) -> Result<Expr, ExprError> {
    Parser::default().parse(text)
}

/// A canonical-text parser with a nesting limit.
#[derive(Debug, Clone, Copy)]
pub struct Parser {
    max_depth: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

impl Parser {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize { self.max_depth }

    pub fn parse<'a>(&self, text: &'a str) -> Result<Expr, ExprError> {
        let result = delimited(multispace0, |i: &'a str| self.expr(i, 1), multispace0)(text);
        let expr = match result {
            Ok(("", expr)) => expr,
            Ok((rest, _)) => {
                return Err(ExprError::Syntax {
                    offset: text.len() - rest.len(),
                    reason: SyntaxReason::TrailingInput,
                })
            }
            Err(nom::Err::Error(fault)) | Err(nom::Err::Failure(fault)) => {
                return Err(fault.into_error(text, self.max_depth))
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(ExprError::Syntax { offset: text.len(), reason: SyntaxReason::Unexpected })
            }
        };

        // The inline guard counts parser levels; a selector adds a tree level the
        // guard does not see, so confirm against the real height.
        if expr.depth() > self.max_depth {
            return Err(ExprError::TooDeep { limit: self.max_depth });
        }
        Ok(expr)
    }

    fn expr<'a>(&self, input: &'a str, depth: usize) -> PResult<'a, Expr> {
        if depth > self.max_depth {
            return Err(nom::Err::Failure(Fault { input, kind: FaultKind::TooDeep }));
        }

        let (rest, head) = alt((|i: &'a str| self.call(i, depth), map(identifier, leaf)))(input)?;
        let (rest, selector) = opt(preceded(
            pair(multispace0, char('[')),
            cut(terminated(ws(string_lit), char(']'))),
        ))(rest)?;

        let Some(selector) = selector else {
            return Ok((rest, head));
        };
        match ScriptChildSelector::new(head, selector) {
            Ok(sel) => Ok((rest, Expr::ScriptChild(sel))),
            Err(_) => Err(nom::Err::Failure(Fault::syntax(input, SyntaxReason::DatasetSelector))),
        }
    }

    fn call<'a>(&self, input: &'a str, depth: usize) -> PResult<'a, Expr> {
        let (rest, op) = identifier(input)?;
        let (rest, script) = opt(preceded(char('@'), cut(string_lit)))(rest)?;
        let (rest, _) = preceded(multispace0, char('('))(rest)?;
        // Past the opening paren this can only be a call, so stop backtracking.
        let (rest, args) = cut(terminated(
            separated_list0(char(','), |i: &'a str| self.arg(i, depth + 1)),
            preceded(multispace0, char(')')),
        ))(rest)?;

        let mut operands = Vec::new();
        let mut params = BTreeMap::new();
        for arg in args {
            match arg {
                Arg::Operand(expr) => operands.push(expr),
                Arg::Param(key, value) => {
                    if params.insert(key, value).is_some() {
                        return Err(nom::Err::Failure(Fault::syntax(input, SyntaxReason::DuplicateParam)));
                    }
                }
            }
        }

        let node = OperatorNode { op: op.to_string(), script, operands, params };
        Ok((rest, Expr::Operator(node)))
    }

    fn arg<'a>(&self, input: &'a str, depth: usize) -> PResult<'a, Arg> {
        ws(alt((keyword_arg, map(|i: &'a str| self.expr(i, depth), Arg::Operand))))(input)
    }
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn leaf(name: &str) -> Expr {
    if name == PLACEHOLDER { Expr::Dummy } else { Expr::dataset(name) }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || matches!(c, '.' | ':' | '/' | '-')
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(take_while1(is_ident_start), take_while(is_ident_char)))(input)
}

/// True when `text` is exactly one identifier, as accepted for operator names,
/// dataset names, and parameter keys.
pub fn is_identifier(text: &str) -> bool {
    matches!(identifier(text), Ok(("", _)))
}

fn string_lit(input: &str) -> PResult<'_, String> {
    let body = escaped_transform(
        is_not("\\\""),
        '\\',
        alt((value("\\", tag("\\")), value("\"", tag("\"")), value("\n", tag("n")))),
    );
    // `escaped_transform` rejects an empty body, hence the `opt`.
    delimited(char('"'), map(opt(body), |s: Option<String>| s.unwrap_or_default()), char('"'))(input)
}

fn exponent(input: &str) -> PResult<'_, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn float(input: &str) -> PResult<'_, ParamValue> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            alt((recognize(pair(preceded(char('.'), digit1), opt(exponent))), exponent)),
        ))),
        |text: &str| text.parse::<f64>().map(ParamValue::Float),
    )(input)
}

fn integer(input: &str) -> PResult<'_, ParamValue> {
    map_res(recognize(pair(opt(char('-')), digit1)), |text: &str| {
        text.parse::<i64>().map(ParamValue::Int)
    })(input)
}

fn boolean(input: &str) -> PResult<'_, ParamValue> {
    alt((
        value(ParamValue::Bool(true), tag("true")),
        value(ParamValue::Bool(false), tag("false")),
    ))(input)
}

fn param_value(input: &str) -> PResult<'_, ParamValue> {
    alt((map(string_lit, ParamValue::Str), boolean, float, integer))(input)
}

fn keyword_arg(input: &str) -> PResult<'_, Arg> {
    let (rest, key) = terminated(identifier, pair(multispace0, char('=')))(input)?;
    let (rest, value) = cut(preceded(multispace0, param_value))(rest)?;
    Ok((rest, Arg::Param(key.to_string(), value)))
}
