//! URI template compilation, matching and expansion.
//!
//! Two template dialects are supported:
//!
//! - [`Dialect::Simple`]: `/widgets/{id}` and `/files/{path: .+}`
//! - [`Dialect::Extended`]: `/search/{term=rust}` and operators such as
//!   `/items/{-list|,|tags}`
//!
//! ```
//! use uri_template_engine::{compile, MultivaluedMap};
//!
//! let template = compile("/widgets/{id}").unwrap();
//! let mut matcher = template.matcher();
//! assert!(matcher.matches("/widgets/42/parts"));
//! assert_eq!(matcher.get_variable_value("id", true).unwrap().as_deref(), Some("42"));
//! assert_eq!(matcher.get_tail(true).unwrap(), "/parts");
//!
//! let mut values = MultivaluedMap::new();
//! values.add("id", "7".to_string());
//! assert_eq!(template.expand(&values, true).unwrap(), "/widgets/7");
//! ```

pub mod codec;
pub mod config;
pub mod domain;
pub mod error;
pub mod multimap;
pub mod registry;
pub mod segment;
mod utils;

pub use config::{catalog::TemplateCatalog, CompileOptions, Dialect};
pub use domain::template::{
    compare_specificity, expand_template, CapturingGroup, MatchedValues, OperatorKind, Template,
    TemplateElement, TemplateMatcher,
};
pub use error::{Result, TemplateError};
pub use multimap::MultivaluedMap;
pub use registry::TemplateCache;
pub use segment::{split_path, PathSegment};
pub use utils::normalize_uri;

/// Compile a simple-dialect template as written
pub fn compile(template: &str) -> Result<Template> {
    Template::compile(template, Dialect::Simple)
}

/// Compile a template in the dialect given by `options`, normalizing it
/// first unless `options.normalize` is off
pub fn compile_with(template: &str, options: CompileOptions) -> Result<Template> {
    Template::compile_with(template, options)
}

/// Check whether `path` matches `template`.
///
/// The template is normalized and compiled once into the global
/// [`TemplateCache`]. One leading slash of `path` is ignored, mirroring the
/// normalization of the template.
pub fn matches(template: &str, path: &str) -> Result<bool> {
    let compiled = TemplateCache::global().get_or_compile(template, CompileOptions::default())?;
    let path = path.strip_prefix('/').unwrap_or(path);
    Ok(compiled.matcher().matches(path))
}
