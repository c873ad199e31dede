use crate::error::MacroError;
use crate::expr::Expr;
use crate::macros::Macro;
use indexmap::IndexMap;
use tracing::debug;

/// Name → macro table.
///
/// Iteration follows registration order, which is also the order the rewriter tries
/// macros in. Re-registering a name replaces the template but keeps its original
/// position. Entries are never removed individually.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    macros: IndexMap<String, Macro>,
}

impl Registry {
    pub fn new() -> Self { Self::default() }
    pub fn count(&self) -> usize { self.macros.len() }
    pub fn is_empty(&self) -> bool { self.macros.is_empty() }

    /// Registers `mac`, returning the macro it replaced, if any.
    pub fn register(&mut self, mac: Macro) -> Option<Macro> {
        debug!(macro_name = %mac.name, arity = mac.arity(), "registering macro");
        self.macros.insert(mac.name.clone(), mac)
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    /// Macros in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Macro> {
        self.macros.values()
    }

    /// `(name, rendered template)` pairs sorted by name.
    pub fn listing(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .macros
            .values()
            .map(|m| (m.name.clone(), m.rendered()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Instantiates the macro registered under `name`.
    pub fn invoke(&self, name: &str, args: impl IntoIterator<Item = Expr>) -> Result<Expr, MacroError> {
        self.get(name)
            .ok_or_else(|| MacroError::UnknownMacro(name.to_string()))?
            .invoke(args)
    }
}
