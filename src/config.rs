use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::transpiler::Toolchain;

/// Driver settings read from an optional YAML file. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    pub compiler: String,
    pub compiler_flags: Vec<String>,
    /// Roots searched, in order, when resolving `import` declarations.
    pub search_paths: Vec<PathBuf>,
    pub debug_lexer: bool,
}

impl Default for Config {
    fn default() -> Self {
        let toolchain = Toolchain::default();
        Self {
            compiler: toolchain.compiler,
            compiler_flags: toolchain.flags,
            search_paths: Vec::new(),
            debug_lexer: false,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Reading config {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Parsing config {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as null rather than an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    pub fn toolchain(&self) -> Toolchain {
        Toolchain {
            compiler: self.compiler.clone(),
            flags: self.compiler_flags.clone(),
        }
    }
}
