//! FFI bindings exposing the macro engine to Python. Everything crosses the
//! boundary as canonical text.

use crate::config::MacroConfig;
use crate::engine::MacroEngine;
use crate::error::MacroError;
use pyo3::exceptions::{PyIOError, PyKeyError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

fn to_py_err(e: MacroError) -> PyErr {
    match e {
        MacroError::UnknownMacro(_) => PyKeyError::new_err(e.to_string()),
        MacroError::PersistenceRead { .. } | MacroError::PersistenceWrite { .. } => PyIOError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

fn checked_max_depth(depth: usize) -> PyResult<usize> {
    if depth == 0 {
        return Err(PyValueError::new_err("max_depth must be at least 1"));
    }
    Ok(depth)
}

#[pyclass(name = "_MacroEngine")]
#[derive(Debug, Default)]
pub struct PyMacroEngine {
    inner: MacroEngine,
}

#[pymethods]
impl PyMacroEngine {
    #[new]
    #[pyo3(signature = (store_path = None, max_depth = None))]
    pub fn new(store_path: Option<PathBuf>, max_depth: Option<usize>) -> PyResult<Self> {
        let mut config = MacroConfig::from_env();
        if let Some(path) = store_path { config.store_path = path; }
        if let Some(depth) = max_depth { config.max_depth = checked_max_depth(depth)?; }
        Ok(Self { inner: MacroEngine::new(config) })
    }

    /// Returns the canonical template text of the new macro.
    #[pyo3(signature = (name, expr, explicit_params = Vec::new()))]
    pub fn define_macro(&self, name: &str, expr: &str, explicit_params: Vec<String>) -> PyResult<String> {
        let params: Vec<&str> = explicit_params.iter().map(String::as_str).collect();
        self.inner
            .define_macro_str(name, expr, &params)
            .map(|m| m.rendered())
            .map_err(to_py_err)
    }

    pub fn invoke(&self, name: &str, args: Vec<String>) -> PyResult<String> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.inner.invoke_str(name, &args).map_err(to_py_err)
    }

    #[pyo3(signature = (text, include_top = true))]
    pub fn rewrite(&self, text: &str, include_top: bool) -> PyResult<String> {
        self.inner.rewrite(text, include_top).map_err(to_py_err)
    }

    /// Soft load: returns the number of macros loaded, 0 when the store is unusable.
    #[pyo3(signature = (path = None))]
    pub fn load(&self, path: Option<PathBuf>) -> usize {
        match path {
            Some(p) => self.inner.load(&p),
            None => self.inner.load_default(),
        }
    }

    #[pyo3(signature = (path = None))]
    pub fn save(&self, path: Option<PathBuf>) -> PyResult<()> {
        let result = match path {
            Some(p) => self.inner.save(&p),
            None => self.inner.save_default(),
        };
        result.map_err(to_py_err)
    }

    pub fn list_macros(&self) -> Vec<(String, String)> {
        self.inner.list_macros()
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    pub fn __len__(&self) -> usize {
        self.inner.snapshot().count()
    }
}
