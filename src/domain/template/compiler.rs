// Template compilation
//
// The parser output is turned into an element list and a single anchored
// regular expression:
//
//   ^( literal-and-variable portion )( tail )$
//
// Group 1 is the head, every variable and operator owns the next group in
// template order, and the last group is the tail.

use std::fmt;
use std::hash::{Hash, Hasher};

use regex::Regex;
use tracing::debug;

use super::ast::{CapturingGroup, Literal, Operator, TemplateElement, Variable};
use super::matcher::TemplateMatcher;
use super::parser::{TemplateParser, TemplatePart};
use crate::codec;
use crate::config::{CompileOptions, Dialect};
use crate::error::{Result, TemplateError};
use crate::multimap::MultivaluedMap;
use crate::utils::normalize_uri;

const HEAD_GROUP: usize = 1;
const TAIL_REGEX: &str = "(/.*)?";
const ROOT_TAIL_REGEX: &str = "(.*)?";
const TAIL_NAME: &str = "template.tail";

/// A compiled URI template.
///
/// Immutable once built. Matching goes through [`Template::matcher`], and
/// expansion through [`Template::expand`].
#[derive(Debug, Clone)]
pub struct Template {
    template: String,
    dialect: Dialect,
    regex: Regex,
    elements: Vec<TemplateElement>,
    // variable name -> indices into `elements`, in template order
    variables: MultivaluedMap<usize>,
    tail_group: usize,
    literal_chars: usize,
    explicit_regexes: usize,
}

impl Template {
    /// Compile `template` as written
    pub fn compile(template: &str, dialect: Dialect) -> Result<Self> {
        let parsed = TemplateParser::parse(template, dialect)?;
        let mut builder = PatternBuilder::new(template, dialect);
        for part in parsed.parts {
            builder.part(part)?;
        }
        builder.finish(parsed.trailing)
    }

    /// Compile `template`, normalizing it first when the options ask for it
    pub fn compile_with(template: &str, options: CompileOptions) -> Result<Self> {
        if options.normalize {
            Self::compile(&normalize_uri(template), options.dialect)
        } else {
            Self::compile(template, options.dialect)
        }
    }

    /// The template text this was compiled from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The generated regular expression
    pub fn pattern_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn elements(&self) -> &[TemplateElement] {
        &self.elements
    }

    /// Names of all variables, in the order they are first declared
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.keys().collect()
    }

    /// Number of literal characters, after encoding
    pub fn literal_chars(&self) -> usize {
        self.literal_chars
    }

    /// Number of distinct variable names
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Number of variables declared with their own regular expression
    pub fn explicit_regexes(&self) -> usize {
        self.explicit_regexes
    }

    /// A matcher bound to this template
    pub fn matcher(&self) -> TemplateMatcher<'_> {
        TemplateMatcher::new(self)
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }

    pub(crate) fn head_group(&self) -> usize {
        HEAD_GROUP
    }

    pub(crate) fn tail_group(&self) -> usize {
        self.tail_group
    }

    pub(crate) fn variable_groups(&self) -> &MultivaluedMap<usize> {
        &self.variables
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

impl PartialEq for Template {
    fn eq(&self, other: &Self) -> bool {
        self.template == other.template && self.dialect == other.dialect
    }
}

impl Eq for Template {}

impl Hash for Template {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.template.hash(state);
        self.dialect.hash(state);
    }
}

/// Accumulates the pattern and element list during one compilation
struct PatternBuilder<'a> {
    template: &'a str,
    dialect: Dialect,
    pattern: String,
    elements: Vec<TemplateElement>,
    variables: MultivaluedMap<usize>,
    group_id: usize,
    literal_chars: usize,
    explicit_regexes: usize,
}

impl<'a> PatternBuilder<'a> {
    fn new(template: &'a str, dialect: Dialect) -> Self {
        let mut pattern = String::with_capacity(template.len() * 2 + 16);
        // open the head group
        pattern.push('(');
        Self {
            template,
            dialect,
            pattern,
            elements: Vec::new(),
            variables: MultivaluedMap::new(),
            group_id: HEAD_GROUP,
            literal_chars: 0,
            explicit_regexes: 0,
        }
    }

    fn part(&mut self, part: TemplatePart<'_>) -> Result<()> {
        match part {
            TemplatePart::Literal(text) => self.literal(text),
            TemplatePart::Variable {
                name,
                regex,
                default,
            } => {
                let variable = Variable::new(name, regex, default, self.next_group());
                if variable.has_constraint() {
                    self.explicit_regexes += 1;
                }
                self.push_group(TemplateElement::Variable(variable));
                Ok(())
            }
            TemplatePart::Operator { name, arg, vars } => {
                let operator = Operator::new(self.template, name, arg, &vars, self.next_group())?;
                self.push_group(TemplateElement::Operator(operator));
                Ok(())
            }
        }
    }

    fn literal(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let text = match self.dialect {
            Dialect::Simple => codec::encode_template_literal(text),
            Dialect::Extended => text.to_string(),
        };
        self.literal_chars += text.chars().count();
        let element = TemplateElement::Literal(Literal::new(self.template, text)?);
        element.build(&mut self.pattern);
        self.elements.push(element);
        Ok(())
    }

    fn next_group(&mut self) -> usize {
        self.group_id += 1;
        self.group_id
    }

    fn push_group(&mut self, element: TemplateElement) {
        element.build(&mut self.pattern);
        let index = self.elements.len();
        match &element {
            TemplateElement::Variable(variable) => self.variables.add(variable.name(), index),
            TemplateElement::Operator(operator) => {
                for name in operator.variables() {
                    self.variables.add(name, index);
                }
            }
            TemplateElement::Literal(_) => {}
        }
        self.elements.push(element);
    }

    fn finish(mut self, trailing: &str) -> Result<Template> {
        self.literal(trailing.strip_suffix('/').unwrap_or(trailing))?;

        // close the head group
        self.pattern.push(')');

        // a root template lets its tail start without a slash
        let tail_regex = if self.elements.is_empty() {
            ROOT_TAIL_REGEX
        } else {
            TAIL_REGEX
        };
        let tail_group = self.next_group();
        Variable::new(TAIL_NAME, Some(tail_regex), None, tail_group).build(&mut self.pattern);

        let anchored = format!("^{}$", self.pattern);
        let regex = Regex::new(&anchored).map_err(|source| TemplateError::InvalidPattern {
            template: self.template.to_string(),
            source,
        })?;

        if regex.captures_len() != tail_group + 1 {
            return Err(TemplateError::grammar(
                self.template,
                "Variable regular expression changes the group layout",
            ));
        }

        debug!(
            template = self.template,
            pattern = regex.as_str(),
            groups = tail_group,
            "compiled template"
        );

        Ok(Template {
            template: self.template.to_string(),
            dialect: self.dialect,
            regex,
            elements: self.elements,
            variables: self.variables,
            tail_group,
            literal_chars: self.literal_chars,
            explicit_regexes: self.explicit_regexes,
        })
    }
}
