// Template expansion

use super::ast::{CapturingGroup, Operator, Variable};
use super::compiler::Template;
use super::parser::{TemplateParser, TemplatePart};
use crate::config::Dialect;
use crate::error::Result;
use crate::multimap::MultivaluedMap;

impl Template {
    /// Build a concrete path by filling `values` into the template.
    ///
    /// Variables without a value fall back to their default. With `encode`
    /// off, values are emitted as given and literals are decoded.
    pub fn expand(&self, values: &MultivaluedMap<String>, encode: bool) -> Result<String> {
        let mut out = String::with_capacity(self.template().len() + 16);
        for element in self.elements() {
            element.expand(values, encode, &mut out)?;
        }
        Ok(out)
    }
}

/// Expand `template` directly from its text, without compiling a pattern.
///
/// Literals are copied verbatim and values are never encoded. The trailing
/// slash of the template is kept.
pub fn expand_template(
    template: &str,
    dialect: Dialect,
    values: &MultivaluedMap<String>,
) -> Result<String> {
    let parsed = TemplateParser::parse(template, dialect)?;
    let mut out = String::with_capacity(template.len() + 16);

    for part in parsed.parts {
        match part {
            TemplatePart::Literal(text) => out.push_str(text),
            TemplatePart::Variable { name, default, .. } => {
                Variable::new(name, None, default, 0).expand(values, false, &mut out)?;
            }
            TemplatePart::Operator { name, arg, vars } => {
                Operator::new(template, name, arg, &vars, 0)?.expand(values, false, &mut out)?;
            }
        }
    }
    out.push_str(parsed.trailing);

    Ok(out)
}
