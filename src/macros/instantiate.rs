//! instantiate.rs
//! Fills a template's placeholders from an ordered argument list.

use crate::error::MacroError;
use crate::expr::{Expr, OperatorNode, ScriptChildSelector};
use std::collections::VecDeque;

/// Name reported in arity errors when the template is not a registered macro.
pub const ANONYMOUS: &str = "<anonymous>";

/// Replaces each `Dummy` of `template`, in canonical order, with the next argument.
///
/// Running out of arguments fails as soon as the unfilled placeholder is reached.
/// Leftover arguments are reported once the whole template has been filled.
pub fn instantiate(template: &Expr, args: impl IntoIterator<Item = Expr>) -> Result<Expr, MacroError> {
    let queue: VecDeque<Expr> = args.into_iter().collect();
    let mut filler = Filler {
        expected: template.arity(),
        supplied: queue.len(),
        queue,
    };

    let expr = filler.fill(template)?;
    if !filler.queue.is_empty() {
        return Err(MacroError::ArgumentCountTooMany {
            name: ANONYMOUS.to_string(),
            expected: filler.expected,
            supplied: filler.supplied,
        });
    }
    Ok(expr)
}

struct Filler {
    queue: VecDeque<Expr>,
    expected: usize,
    supplied: usize,
}

impl Filler {
    fn fill(&mut self, template: &Expr) -> Result<Expr, MacroError> {
        match template {
            Expr::Dummy => self.queue.pop_front().ok_or_else(|| MacroError::ArgumentCountTooFew {
                name: ANONYMOUS.to_string(),
                expected: self.expected,
                supplied: self.supplied,
            }),
            Expr::Dataset(ds) => Err(MacroError::MalformedTemplate(format!(
                "dataset '{}' found inside a template",
                ds.name
            ))),
            Expr::Operator(node) => {
                let operands = node
                    .operands
                    .iter()
                    .map(|operand| self.fill(operand))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Expr::Operator(OperatorNode {
                    op: node.op.clone(),
                    script: node.script.clone(),
                    operands,
                    params: node.params.clone(),
                }))
            }
            Expr::ScriptChild(sel) => {
                let parent = self.fill(sel.parent())?;
                Ok(Expr::ScriptChild(ScriptChildSelector::new(parent, sel.selector())?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{parse, ExprError};
    use crate::macros::compiler::compile;
    use crate::macros::matcher::match_template;
    use rstest::rstest;

    fn args(names: &[&str]) -> Vec<Expr> {
        names.iter().map(|n| Expr::dataset(*n)).collect()
    }

    #[test]
    fn test_instantiate_fills_in_order() {
        let template = parse(r#"avg(ARG, ARG, window="5d")"#).unwrap();
        let expr = instantiate(&template, args(&["x", "y"])).unwrap();
        assert_eq!(expr.to_string(), r#"avg(x, y, window="5d")"#);
    }

    #[rstest]
    #[case(1, "too_few")]
    #[case(2, "ok")]
    #[case(3, "too_many")]
    fn test_instantiate_arity(#[case] count: usize, #[case] outcome: &str) {
        let template = parse("ratio(ARG, norm(ARG))").unwrap();
        let supplied: Vec<Expr> = (0..count).map(|i| Expr::dataset(format!("d{}", i))).collect();
        let result = instantiate(&template, supplied);
        match (outcome, result) {
            ("ok", Ok(expr)) => assert_eq!(expr.to_string(), "ratio(d0, norm(d1))"),
            ("too_few", Err(MacroError::ArgumentCountTooFew { expected: 2, supplied: 1, .. })) => {}
            ("too_many", Err(MacroError::ArgumentCountTooMany { expected: 2, supplied: 3, .. })) => {}
            (outcome, other) => panic!("Expected {}, got {:?}", outcome, other),
        }
    }

    #[test]
    fn test_instantiate_rejects_dataset_in_template() {
        let not_a_template = parse("avg(ARG, raw)").unwrap();
        let err = instantiate(&not_a_template, args(&["x"])).unwrap_err();
        assert!(matches!(err, MacroError::MalformedTemplate(_)));
    }

    #[test]
    fn test_instantiate_rejects_dataset_as_selector_parent() {
        let template = parse(r#"ARG["slope"]"#).unwrap();
        let err = instantiate(&template, args(&["raw"])).unwrap_err();
        assert!(matches!(err, MacroError::Expr(ExprError::InvalidSelectorParent { .. })));

        let ok = instantiate(&template, vec![parse("fit(raw)").unwrap()]).unwrap();
        assert_eq!(ok.to_string(), r#"fit(raw)["slope"]"#);
    }

    #[test]
    fn test_instantiate_placeholder_free_template() {
        let template = parse("now()").unwrap();
        assert_eq!(instantiate(&template, Vec::new()).unwrap(), template);
    }

    #[rstest]
    #[case(r#"avg(datasetA, datasetB, window="5d")"#)]
    #[case(r#"fit@"fit.R"(ratio(a, norm(b)), order=2)["slope"]"#)]
    #[case("sum(x, sum(y, z), scale=0.5)")]
    fn test_compile_then_instantiate_round_trip(#[case] text: &str) {
        let instance = parse(text).unwrap();
        let template = compile(&instance, &[]).unwrap();
        let leaves: Vec<Expr> = instance.leaves().cloned().collect();
        assert_eq!(instantiate(&template, leaves).unwrap().to_string(), text);
    }

    #[rstest]
    #[case("ratio(ARG, norm(ARG))", "ratio(avg(a, b), norm(c))")]
    #[case(r#"ARG["slope"]"#, r#"fit(obs)["slope"]"#)]
    #[case(r#"avg(ARG, ARG, window="5d")"#, r#"avg(datasetC, datasetD, window="5d")"#)]
    fn test_match_soundness(#[case] template: &str, #[case] candidate: &str) {
        let template = parse(template).unwrap();
        let candidate = parse(candidate).unwrap();
        let bindings = match_template(&template, &candidate).into_bindings().unwrap();
        assert_eq!(instantiate(&template, bindings).unwrap().to_string(), candidate.to_string());
    }
}
