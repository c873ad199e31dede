//! Engine configuration: where the macro store lives and how deep expressions may nest.
use crate::expr::parser::{Parser, DEFAULT_MAX_DEPTH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Overrides the store location.
pub const STORE_PATH_ENV: &str = "CRS_MACRO_STORE";
/// Overrides the nesting limit.
pub const MAX_DEPTH_ENV: &str = "CRS_MACRO_MAX_DEPTH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroConfig {
    /// Store used by `load_default` / `save_default`.
    pub store_path: PathBuf,
    /// Maximum expression height accepted by the parser and the engine.
    pub max_depth: usize,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MacroConfig {
    /// Defaults, overridden by `CRS_MACRO_STORE` and `CRS_MACRO_MAX_DEPTH` when set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(path) = lookup(STORE_PATH_ENV).filter(|p| !p.trim().is_empty()) {
            config.store_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup(MAX_DEPTH_ENV) {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => warn!(value = %raw, "ignoring invalid {}", MAX_DEPTH_ENV),
            }
        }
        config
    }

    pub fn parser(&self) -> Parser {
        Parser::new(self.max_depth)
    }
}

/// `<config dir>/crs-macros/macros.json`, or a relative path when no config dir is known.
pub fn default_store_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("crs-macros")
        .join("macros.json")
}
