use std::collections::HashSet;

use tracing::warn;

use super::{yml_settings::YmlSettings, CompileOptions};
use crate::domain::Template;
use crate::error::{Result, TemplateError};

/// A named list of templates loaded from YAML.
///
/// ```yaml
/// - name: widget
///   template: /widgets/{id}
/// - name: search
///   template: /search{-opt|?|q}{-join|&|q}
///   dialect: extended
///   normalize: false
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemplateCatalog {
    entries: Vec<YmlSettings>,
}

impl TemplateCatalog {
    pub fn new(entries: Vec<YmlSettings>) -> Self {
        Self { entries }
    }

    pub fn from_yaml(yml: &str) -> Result<Self> {
        let entries: Vec<YmlSettings> = serde_yaml::from_str(yml)?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[YmlSettings] {
        &self.entries
    }

    /// Compile every entry with `defaults`, letting each entry override the
    /// dialect and normalization.
    ///
    /// Fails on a duplicate name or on the first template that does not compile.
    pub fn compile_all(&self, defaults: CompileOptions) -> Result<Vec<(String, Template)>> {
        let mut seen = HashSet::new();
        let mut compiled = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if !seen.insert(entry.name.as_str()) {
                return Err(TemplateError::DuplicateTemplate {
                    name: entry.name.clone(),
                });
            }

            let options = CompileOptions {
                dialect: entry.dialect.unwrap_or(defaults.dialect),
                normalize: entry.normalize.unwrap_or(defaults.normalize),
            };
            let template = Template::compile_with(&entry.template, options).inspect_err(|e| {
                warn!(name = %entry.name, template = %entry.template, error = %e, "template failed to compile");
            })?;
            compiled.push((entry.name.clone(), template));
        }

        Ok(compiled)
    }
}
