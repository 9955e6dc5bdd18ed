// Compilation settings and the YAML template catalog

pub mod catalog;
pub mod yml_settings;

use serde::{Deserialize, Serialize};

/// Template grammar dialect
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `{name}` and `{name: regex}` variables
    #[default]
    Simple,
    /// `{name=default}` variables and `{-op|arg|vars}` operators
    Extended,
}

/// Options consumed by [`crate::compile_with`]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(default)]
pub struct CompileOptions {
    pub dialect: Dialect,
    /// Run [`crate::normalize_uri`] on the template before compiling it
    pub normalize: bool,
}

impl CompileOptions {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            normalize: true,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new(Dialect::Simple)
    }
}
