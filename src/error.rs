// Error handling for the template engine

use thiserror::Error;

/// Errors raised while compiling, matching or expanding templates
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template text does not follow the grammar of its dialect
    #[error("Syntax error in template '{template}': {message}")]
    Grammar { template: String, message: String },

    /// A variable constraint was rejected by the regular expression engine
    #[error("Invalid regular expression in template '{template}': {source}")]
    InvalidPattern {
        template: String,
        #[source]
        source: regex::Error,
    },

    /// A matcher accessor was called without a preceding successful match
    #[error("Last match was unsuccessful")]
    UnmatchedState,

    /// Expansion found neither a value nor a default for a variable
    #[error("Variable '{name}' was not supplied a value")]
    MissingVariable { name: String },

    /// The join operator was given more than one value for a variable
    #[error("Variable '{name}' has {count} values, the join operator accepts at most one")]
    JoinArity { name: String, count: usize },

    /// Two catalog entries share the same name
    #[error("Duplicate template name: {name}")]
    DuplicateTemplate { name: String },

    /// The template catalog could not be parsed
    #[error("Invalid template catalog: {0}")]
    Catalog(#[from] serde_yaml::Error),
}

impl TemplateError {
    pub(crate) fn grammar(template: &str, message: impl Into<String>) -> Self {
        TemplateError::Grammar {
            template: template.to_string(),
            message: message.into(),
        }
    }

    /// Whether this error was raised while compiling a template
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            TemplateError::Grammar { .. } | TemplateError::InvalidPattern { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;
