use crate::store::Registry;
use std::fmt::Write;

/// Renders the registry as a table, one macro per line, sorted by name.
///
/// ```text
/// MACRO REGISTRY (1 macro):
/// --------------------------------------------------
///   macroAvg/2 = avg(ARG, ARG, window="5d")
/// ```
pub fn format_listing(registry: &Registry) -> String {
    let mut output = String::new();
    let count = registry.count();
    let noun = if count == 1 { "macro" } else { "macros" };
    let _ = writeln!(output, "MACRO REGISTRY ({} {}):", count, noun);
    let _ = writeln!(output, "--------------------------------------------------");

    if count == 0 {
        let _ = writeln!(output, "  (empty)");
        return output;
    }

    let listing = registry.listing();
    let width = listing
        .iter()
        .filter_map(|(name, _)| registry.get(name).map(|m| name.len() + 1 + m.arity().to_string().len()))
        .max()
        .unwrap_or(0);

    for (name, template) in listing {
        let arity = registry.get(&name).map_or(0, |m| m.arity());
        let label = format!("{}/{}", name, arity);
        let _ = writeln!(output, "  {:<width$} = {}", label, template, width = width);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse;
    use crate::macros::Macro;

    #[test]
    fn test_format_empty_registry() {
        let text = format_listing(&Registry::new());
        assert!(text.starts_with("MACRO REGISTRY (0 macros):"));
        assert!(text.contains("(empty)"));
    }

    #[test]
    fn test_format_aligns_labels() {
        let mut reg = Registry::new();
        reg.register(Macro::new("macroAvg", parse(r#"avg(ARG, ARG, window="5d")"#).unwrap()).unwrap());
        reg.register(Macro::new("id", parse("now()").unwrap()).unwrap());

        let text = format_listing(&reg);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "MACRO REGISTRY (2 macros):");
        assert_eq!(lines[2], "  id/0       = now()");
        assert_eq!(lines[3], r#"  macroAvg/2 = avg(ARG, ARG, window="5d")"#);
    }
}
