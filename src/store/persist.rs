//! persist.rs
//! JSON store for the macro registry.
//!
//! The document is a single object mapping macro name to the canonical text of its
//! template, with placeholders written as the reserved token:
//!
//! ```json
//! { "macroAvg": "avg(ARG, ARG, window=\"5d\")" }
//! ```

use super::registry::Registry;
use crate::error::MacroError;
use crate::expr::Parser;
use crate::macros::{compile_str, Macro};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// On-disk shape of the store. `BTreeMap` keeps the output ordered by name.
pub type StoreDocument = BTreeMap<String, String>;

pub fn to_document(registry: &Registry) -> StoreDocument {
    registry.listing().into_iter().collect()
}

pub fn read_document(path: &Path) -> Result<StoreDocument, MacroError> {
    let read_err = |reason: String| MacroError::PersistenceRead { path: path.to_path_buf(), reason };
    let text = fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| read_err(e.to_string()))
}

/// Reads the store and recompiles every entry.
///
/// All entries are compiled before anything is returned, so one bad entry rejects
/// the whole document.
pub fn read_macros(path: &Path, parser: &Parser) -> Result<Vec<Macro>, MacroError> {
    let document = read_document(path)?;
    let mut staged = Vec::with_capacity(document.len());
    for (name, text) in document {
        let entry_err = |e: MacroError| MacroError::PersistenceRead {
            path: path.to_path_buf(),
            reason: format!("entry '{}': {}", name, e),
        };
        let template = compile_str(&text, &[], parser).map_err(entry_err)?;
        staged.push(Macro::new(name.clone(), template).map_err(entry_err)?);
    }
    Ok(staged)
}

/// Writes the whole document, replacing whatever was at `path`.
///
/// The text goes to a temporary file in the destination directory first and is then
/// renamed over the target, so readers never observe a half-written store.
pub fn write_document(path: &Path, document: &StoreDocument) -> Result<(), MacroError> {
    let write_err = |source: io::Error| MacroError::PersistenceWrite { path: path.to_path_buf(), source };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir).map_err(write_err)?;

    let mut json = serde_json::to_string_pretty(document).map_err(|e| write_err(e.into()))?;
    json.push('\n');

    let mut tmp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    tmp.write_all(json.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

pub fn save(registry: &Registry, path: &Path) -> Result<(), MacroError> {
    write_document(path, &to_document(registry))
}
