//! The public entry point: an explicit registry plus the operations that use it.
//!
//! Writers (`define_macro`, `load`, `save`) take one exclusive lock for the whole
//! operation. Readers (`invoke`, `rewrite`, `list_macros`) clone an `Arc` snapshot
//! once and work on it without holding the lock, so a registration that lands
//! mid-traversal is never observed.

use crate::config::MacroConfig;
use crate::display::listing;
use crate::error::MacroError;
use crate::expr::Expr;
use crate::macros::{compile, rewrite, Macro};
use crate::store::{persist, Registry};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct MacroEngine {
    registry: Mutex<Arc<Registry>>,
    config: MacroConfig,
}

impl MacroEngine {
    pub fn new(config: MacroConfig) -> Self {
        Self {
            registry: Mutex::new(Arc::new(Registry::new())),
            config,
        }
    }

    pub fn config(&self) -> &MacroConfig { &self.config }

    /// The registry as of now. Later registrations do not affect the returned value.
    pub fn snapshot(&self) -> Arc<Registry> {
        Arc::clone(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Arc<Registry>> {
        // Writers never leave the registry half-updated, so a poisoned lock is still usable.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_depth(&self, expr: &Expr) -> Result<(), MacroError> {
        if expr.depth() > self.config.max_depth {
            return Err(MacroError::TooDeep { limit: self.config.max_depth });
        }
        Ok(())
    }

    // --- Definition ---

    /// Compiles `expr` into a template and registers it under `name`.
    pub fn define_macro(&self, name: &str, expr: &Expr, explicit_params: &[Expr]) -> Result<Macro, MacroError> {
        self.check_depth(expr)?;
        for param in explicit_params {
            self.check_depth(param)?;
        }

        let mut guard = self.lock();
        let mac = Macro::new(name, compile(expr, explicit_params)?)?;
        Arc::make_mut(&mut guard).register(mac.clone());
        Ok(mac)
    }

    /// Text form of `define_macro`.
    pub fn define_macro_str(&self, name: &str, text: &str, explicit_params: &[&str]) -> Result<Macro, MacroError> {
        let parser = self.config.parser();
        let expr = parser.parse(text)?;
        let params = explicit_params
            .iter()
            .map(|p| parser.parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.define_macro(name, &expr, &params)
    }

    // --- Use ---

    pub fn invoke(&self, name: &str, args: Vec<Expr>) -> Result<Expr, MacroError> {
        for arg in &args {
            self.check_depth(arg)?;
        }
        self.snapshot().invoke(name, args)
    }

    /// Text form of `invoke`: arguments and result are canonical text.
    pub fn invoke_str(&self, name: &str, args: &[&str]) -> Result<String, MacroError> {
        let parser = self.config.parser();
        let args = args.iter().map(|a| parser.parse(a)).collect::<Result<Vec<_>, _>>()?;
        Ok(self.invoke(name, args)?.to_string())
    }

    pub fn rewrite(&self, text: &str, include_top: bool) -> Result<String, MacroError> {
        let registry = self.snapshot();
        rewrite(&registry, text, include_top, &self.config.parser())
    }

    /// `(name, rendered template)` for every macro, sorted by name.
    pub fn list_macros(&self) -> Vec<(String, String)> {
        self.snapshot().listing()
    }

    /// Human-readable table of the registry.
    pub fn describe(&self) -> String {
        listing::format_listing(&self.snapshot())
    }

    // --- Persistence ---

    /// Loads the store at `path`, returning how many macros were registered.
    ///
    /// A missing or corrupt store is logged and leaves the registry untouched.
    pub fn load(&self, path: &Path) -> usize {
        match self.try_load(path) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "macro store not loaded");
                0
            }
        }
    }

    /// Like `load`, but reports the failure to the caller.
    pub fn try_load(&self, path: &Path) -> Result<usize, MacroError> {
        let mut guard = self.lock();
        let staged = persist::read_macros(path, &self.config.parser())?;
        let count = staged.len();
        let registry = Arc::make_mut(&mut guard);
        for mac in staged {
            registry.register(mac);
        }
        info!(count, path = %path.display(), "loaded macro store");
        Ok(count)
    }

    /// Writes the full registry to `path`, replacing any previous content.
    pub fn save(&self, path: &Path) -> Result<(), MacroError> {
        let guard = self.lock();
        persist::save(&guard, path)?;
        info!(count = guard.count(), path = %path.display(), "saved macro store");
        Ok(())
    }

    pub fn load_default(&self) -> usize {
        self.load(&self.config.store_path)
    }

    pub fn save_default(&self) -> Result<(), MacroError> {
        self.save(&self.config.store_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse;
    use std::fs;

    fn engine() -> MacroEngine {
        MacroEngine::new(MacroConfig::default())
    }

    #[test]
    fn test_define_and_list() {
        let engine = engine();
        let mac = engine.define_macro_str("macroAvg", r#"avg(datasetA, datasetB, window="5d")"#, &[]).unwrap();
        assert_eq!(mac.arity(), 2);
        assert_eq!(
            engine.list_macros(),
            vec![("macroAvg".to_string(), r#"avg(ARG, ARG, window="5d")"#.to_string())]
        );
    }

    #[test]
    fn test_invoke_by_name() {
        let engine = engine();
        engine.define_macro_str("macroAvg", r#"avg(a, b, window="5d")"#, &[]).unwrap();
        assert_eq!(engine.invoke_str("macroAvg", &["x", "y"]).unwrap(), r#"avg(x, y, window="5d")"#);
        assert!(matches!(
            engine.invoke_str("macroAvg", &["x"]),
            Err(MacroError::ArgumentCountTooFew { expected: 2, supplied: 1, .. })
        ));
        assert!(matches!(
            engine.invoke_str("macroAvg", &["x", "y", "z"]),
            Err(MacroError::ArgumentCountTooMany { expected: 2, supplied: 3, .. })
        ));
        assert!(matches!(engine.invoke("nope", Vec::new()), Err(MacroError::UnknownMacro(_))));
    }

    #[test]
    fn test_rewrite_uses_registered_macros() {
        let engine = engine();
        engine.define_macro_str("macroAvg", r#"avg(a, b, window="5d")"#, &[]).unwrap();
        assert_eq!(
            engine.rewrite(r#"ratio(avg(x, y, window="5d"), z)"#, true).unwrap(),
            "ratio(macroAvg(x, y), z)"
        );
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_definitions() {
        let engine = engine();
        engine.define_macro_str("first", "f(a)", &[]).unwrap();
        let snapshot = engine.snapshot();
        engine.define_macro_str("second", "g(a)", &[]).unwrap();
        assert_eq!(snapshot.count(), 1);
        assert_eq!(engine.snapshot().count(), 2);
    }

    #[test]
    fn test_failed_definition_leaves_registry_unchanged() {
        let engine = engine();
        assert!(engine.define_macro_str("broken", "avg(a,", &[]).is_err());
        assert!(engine.list_macros().is_empty());
    }

    #[test]
    fn test_depth_limit_applies_to_api_expressions() {
        let engine = MacroEngine::new(MacroConfig { max_depth: 3, ..MacroConfig::default() });
        let deep = parse("f(g(h(x)))").unwrap();
        assert!(matches!(engine.define_macro("deep", &deep, &[]), Err(MacroError::TooDeep { limit: 3 })));
        assert!(engine.define_macro("shallow", &parse("g(h(x))").unwrap(), &[]).is_ok());
    }

    #[test]
    fn test_save_then_load_into_fresh_engine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");

        let engine = engine();
        engine.define_macro_str("macroAvg", r#"avg(datasetA, datasetB, window="5d")"#, &[]).unwrap();
        engine.save(&path).unwrap();

        let fresh = MacroEngine::new(MacroConfig::default());
        assert_eq!(fresh.load(&path), 1);
        assert_eq!(fresh.list_macros(), engine.list_macros());
        assert_eq!(
            fresh.list_macros(),
            vec![("macroAvg".to_string(), r#"avg(ARG, ARG, window="5d")"#.to_string())]
        );
    }

    #[test]
    fn test_load_failures_are_soft() {
        let dir = tempfile::tempdir().unwrap();
        let engine = engine();
        engine.define_macro_str("keep", "f(a)", &[]).unwrap();

        assert_eq!(engine.load(&dir.path().join("missing.json")), 0);

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{ not json").unwrap();
        assert_eq!(engine.load(&corrupt), 0);
        assert!(matches!(engine.try_load(&corrupt), Err(MacroError::PersistenceRead { .. })));

        assert_eq!(engine.list_macros(), vec![("keep".to_string(), "f(ARG)".to_string())]);
    }

    #[test]
    fn test_load_overwrites_existing_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        fs::write(&path, r#"{"keep": "g(ARG, ARG)"}"#).unwrap();

        let engine = engine();
        engine.define_macro_str("keep", "f(a)", &[]).unwrap();
        assert_eq!(engine.load(&path), 1);
        assert_eq!(engine.list_macros(), vec![("keep".to_string(), "g(ARG, ARG)".to_string())]);
    }

    #[test]
    fn test_every_accepted_macro_survives_save_and_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("macros.json");
        let engine = engine();

        let candidates: Vec<(&str, Expr)> = vec![
            ("good", parse(r#"avg(a, b, window="5d")"#).unwrap()),
            ("", parse("f(a)").unwrap()),
            ("moving avg", parse("ema(a, span=3)").unwrap()),
            ("ARG", parse("g(a)").unwrap()),
            ("spaced", Expr::operator("moving avg", vec![Expr::dataset("a")])),
            ("badKey", Expr::operator("h", vec![Expr::dataset("a")]).with_param("a b", 1i64)),
            ("nan", Expr::operator("scale", vec![Expr::dataset("a")]).with_param("factor", f64::NAN)),
            ("inf", Expr::operator("scale", vec![Expr::dataset("a")]).with_param("factor", f64::NEG_INFINITY)),
            ("fitSlope", parse(r#"fit@"lib.py"(a, tol=0.5)["slope"]"#).unwrap()),
        ];
        let mut accepted = Vec::new();
        for (name, expr) in &candidates {
            match engine.define_macro(name, expr, &[]) {
                Ok(_) => accepted.push(*name),
                Err(e) => assert!(matches!(e, MacroError::MalformedTemplate(_)), "{}: {:?}", name, e),
            }
        }
        assert_eq!(accepted, vec!["good", "fitSlope"]);

        for (name, expr) in &candidates {
            if accepted.contains(name) {
                let rewritten = engine.rewrite(&expr.to_string(), true).unwrap();
                assert!(parse(&rewritten).is_ok(), "unparseable rewrite: {}", rewritten);
            }
        }

        engine.save(&path).unwrap();
        let fresh = MacroEngine::new(MacroConfig::default());
        assert_eq!(fresh.try_load(&path).unwrap(), accepted.len());
        assert_eq!(fresh.list_macros(), engine.list_macros());
    }

    #[test]
    fn test_default_store_path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = MacroConfig { store_path: dir.path().join("store.json"), ..MacroConfig::default() };
        let engine = MacroEngine::new(config.clone());
        engine.define_macro_str("m", "f(a)", &[]).unwrap();
        engine.save_default().unwrap();

        let fresh = MacroEngine::new(config);
        assert_eq!(fresh.load_default(), 1);
    }
}
