//! Macro engine for computation-expression trees.
//!
//! Expressions are trees of datasets and named operators with a canonical text form.
//! The engine compiles an expression into a parameterized template, registers it by
//! name, recognizes later expressions that structurally match a template, and rewrites
//! expressions by replacing matched subtrees with macro calls.

pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod expr;
pub mod macros;
pub mod store;

#[cfg(feature = "python")]
mod bindings {
    pub mod python;
}

pub use config::MacroConfig;
pub use engine::MacroEngine;
pub use error::MacroError;
pub use expr::{parse, Expr, ExprError, ParamValue, PLACEHOLDER};
pub use macros::{compile, instantiate, match_template, Macro, MatchResult};
pub use store::Registry;

// FFI Facade: the `_core` Python module, built with the `python` feature.
#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A simple function to confirm the Rust core is callable from Python.
#[cfg(feature = "python")]
#[pyfunction]
fn rust_core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(feature = "python")]
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(rust_core_version, m)?)?;
    m.add_class::<bindings::python::PyMacroEngine>()?;
    Ok(())
}
