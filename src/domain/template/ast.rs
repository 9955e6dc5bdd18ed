// Compiled template elements
//
// A compiled template is an ordered list of elements. Every element except
// literals owns exactly one capturing group of the generated pattern.

use std::borrow::Cow;

use crate::codec;
use crate::error::{Result, TemplateError};
use crate::multimap::MultivaluedMap;

/// Zero or more non-slash characters, lazily
pub(crate) const REGEX0: &str = "[^/]*?";
/// One or more non-slash characters, lazily
pub(crate) const REGEX1: &str = "[^/]+?";

/// Values and start offsets collected from the capturing groups of one match.
///
/// `None` values mark variables whose group did not bind anything, which is
/// distinct from a bound empty string.
#[derive(Debug, Clone, Default)]
pub struct MatchedValues {
    pub(crate) values: MultivaluedMap<Option<String>>,
    pub(crate) starts: MultivaluedMap<Option<usize>>,
}

impl MatchedValues {
    pub fn values(&self) -> &MultivaluedMap<Option<String>> {
        &self.values
    }

    pub fn starts(&self) -> &MultivaluedMap<Option<usize>> {
        &self.starts
    }

    fn add(&mut self, name: &str, value: Option<&str>, start: Option<usize>) {
        self.values.add(name, value.map(str::to_string));
        self.starts.add(name, start);
    }

    fn put_single(&mut self, name: &str, value: Option<&str>, start: Option<usize>) {
        self.values.put_single(name, value.map(str::to_string));
        self.starts.put_single(name, start);
    }

    fn put_all(&mut self, name: &str, values: Vec<&str>, start: Option<usize>) {
        let starts = vec![start; values.len()];
        self.values
            .put(name, values.into_iter().map(|v| Some(v.to_string())).collect());
        self.starts.put(name, starts);
    }
}

/// Behavior shared by variables and operators
pub trait CapturingGroup {
    /// 1-based index of the group in the generated pattern
    fn capturing_group_id(&self) -> usize;

    /// Append the pattern fragment for this group
    fn build(&self, pattern: &mut String);

    /// Record the values bound by a successful match.
    ///
    /// `matched` is the captured text and its start offset, or `None` when the
    /// group did not take part in the match.
    fn on_match(&self, matched: Option<(&str, usize)>, out: &mut MatchedValues);

    /// Append the expansion of this group
    fn expand(&self, values: &MultivaluedMap<String>, encode: bool, out: &mut String)
        -> Result<()>;
}

/// One piece of a compiled template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateElement {
    Literal(Literal),
    Variable(Variable),
    Operator(Operator),
}

impl TemplateElement {
    pub fn as_capturing_group(&self) -> Option<&dyn CapturingGroup> {
        match self {
            TemplateElement::Literal(_) => None,
            TemplateElement::Variable(variable) => Some(variable),
            TemplateElement::Operator(operator) => Some(operator),
        }
    }

    pub(crate) fn build(&self, pattern: &mut String) {
        match self {
            TemplateElement::Literal(literal) => literal.build(pattern),
            TemplateElement::Variable(variable) => variable.build(pattern),
            TemplateElement::Operator(operator) => operator.build(pattern),
        }
    }

    pub(crate) fn expand(
        &self,
        values: &MultivaluedMap<String>,
        encode: bool,
        out: &mut String,
    ) -> Result<()> {
        match self {
            TemplateElement::Literal(literal) => {
                literal.expand(encode, out);
                Ok(())
            }
            TemplateElement::Variable(variable) => variable.expand(values, encode, out),
            TemplateElement::Operator(operator) => operator.expand(values, encode, out),
        }
    }
}

/// Literal text between expressions, matched verbatim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    text: String,
}

impl Literal {
    pub(crate) fn new(template: &str, text: String) -> Result<Self> {
        if text.contains(|c: char| c == '{' || c == '}') {
            return Err(TemplateError::grammar(
                template,
                format!("'{}' contains invalid template form", text),
            ));
        }
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn build(&self, pattern: &mut String) {
        pattern.push_str(&regex::escape(&self.text));
    }

    // literals were encoded at compile time, so they are decoded for raw output
    fn expand(&self, encode: bool, out: &mut String) {
        if encode {
            out.push_str(&self.text);
        } else {
            out.push_str(&codec::decode(&self.text));
        }
    }
}

/// A named variable, optionally constrained by a regular expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    regex: Option<String>,
    default: Option<String>,
    group_id: usize,
}

impl Variable {
    pub(crate) fn new(
        name: &str,
        regex: Option<&str>,
        default: Option<&str>,
        group_id: usize,
    ) -> Self {
        Self {
            name: name.to_string(),
            regex: regex.map(convert_groups_to_non_capturing),
            default: default.map(str::to_string),
            group_id,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The effective regular expression of this variable
    pub fn regex(&self) -> &str {
        self.regex.as_deref().unwrap_or(REGEX1)
    }

    /// Whether the template supplied its own regular expression
    pub fn has_constraint(&self) -> bool {
        self.regex.is_some()
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }
}

impl CapturingGroup for Variable {
    fn capturing_group_id(&self) -> usize {
        self.group_id
    }

    fn build(&self, pattern: &mut String) {
        pattern.push('(');
        pattern.push_str(self.regex());
        pattern.push(')');
    }

    fn on_match(&self, matched: Option<(&str, usize)>, out: &mut MatchedValues) {
        out.add(
            &self.name,
            matched.map(|(text, _)| text),
            matched.map(|(_, start)| start),
        );
    }

    fn expand(
        &self,
        values: &MultivaluedMap<String>,
        encode: bool,
        out: &mut String,
    ) -> Result<()> {
        let value = values
            .get_first(&self.name)
            .map(String::as_str)
            .or(self.default.as_deref())
            .ok_or_else(|| TemplateError::MissingVariable {
                name: self.name.clone(),
            })?;
        out.push_str(&encoded(value, encode));
        Ok(())
    }
}

/// The operators of the extended dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Neg,
    Opt,
    Prefix,
    Suffix,
    List,
    Join,
}

impl OperatorKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "neg" => Some(OperatorKind::Neg),
            "opt" => Some(OperatorKind::Opt),
            "prefix" => Some(OperatorKind::Prefix),
            "suffix" => Some(OperatorKind::Suffix),
            "list" => Some(OperatorKind::List),
            "join" => Some(OperatorKind::Join),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperatorKind::Neg => "neg",
            OperatorKind::Opt => "opt",
            OperatorKind::Prefix => "prefix",
            OperatorKind::Suffix => "suffix",
            OperatorKind::List => "list",
            OperatorKind::Join => "join",
        }
    }

    fn single_variable(self) -> bool {
        matches!(
            self,
            OperatorKind::Prefix | OperatorKind::Suffix | OperatorKind::List
        )
    }

    // the argument is split on at match time, so it cannot be empty
    fn splits_on_arg(self) -> bool {
        !matches!(self, OperatorKind::Neg | OperatorKind::Opt)
    }
}

/// An extended-dialect operator such as `{-list|,|tags}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operator {
    kind: OperatorKind,
    arg: String,
    vars: Vec<(String, Option<String>)>,
    group_id: usize,
}

impl Operator {
    pub(crate) fn new(
        template: &str,
        name: &str,
        arg: &str,
        vars: &[(&str, Option<&str>)],
        group_id: usize,
    ) -> Result<Self> {
        let kind = OperatorKind::from_name(name).ok_or_else(|| {
            TemplateError::grammar(template, format!("Unsupported operator '{}'", name))
        })?;

        // a repeated variable keeps its first position and its last default
        let mut unique: Vec<(String, Option<String>)> = Vec::with_capacity(vars.len());
        for (var, default) in vars {
            let default = default.map(str::to_string);
            match unique.iter_mut().find(|(existing, _)| existing == var) {
                Some(entry) => entry.1 = default,
                None => unique.push((var.to_string(), default)),
            }
        }

        if kind.single_variable() && unique.len() != 1 {
            return Err(TemplateError::grammar(
                template,
                format!("The {} operator must have exactly one variable", kind.name()),
            ));
        }
        if kind.splits_on_arg() && arg.is_empty() {
            return Err(TemplateError::grammar(
                template,
                format!("The {} operator requires a non-empty argument", kind.name()),
            ));
        }

        Ok(Self {
            kind,
            arg: arg.to_string(),
            vars: unique,
            group_id,
        })
    }

    pub fn kind(&self) -> OperatorKind {
        self.kind
    }

    pub fn arg(&self) -> &str {
        &self.arg
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.vars.iter().map(|(name, _)| name.as_str())
    }

    pub fn default_value(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(var, _)| var == name)
            .and_then(|(_, default)| default.as_deref())
    }

    fn any_bound(&self, values: &MultivaluedMap<String>) -> bool {
        self.vars
            .iter()
            .any(|(name, _)| values.get(name).is_some_and(|list| !list.is_empty()))
    }

    // supplied values of a variable, falling back to its default when absent
    fn values_of<'v>(
        &'v self,
        (name, default): &'v (String, Option<String>),
        values: &'v MultivaluedMap<String>,
    ) -> Vec<&'v str> {
        match values.get(name) {
            Some(list) => list.iter().map(String::as_str).collect(),
            None => default.as_deref().into_iter().collect(),
        }
    }
}

impl CapturingGroup for Operator {
    fn capturing_group_id(&self) -> usize {
        self.group_id
    }

    fn build(&self, pattern: &mut String) {
        let arg = regex::escape(&self.arg);
        let fragment = match self.kind {
            OperatorKind::Neg | OperatorKind::Opt => format!("({})?", arg),
            OperatorKind::Prefix => format!("((?:{}{})*)", arg, REGEX0),
            OperatorKind::Suffix => format!("((?:{}{})*)", REGEX0, arg),
            OperatorKind::List => format!("({}(?:{}{})*)", REGEX0, arg, REGEX0),
            OperatorKind::Join => {
                let pairs: Vec<String> = self
                    .vars
                    .iter()
                    .map(|(name, _)| format!("(?:{}={})", regex::escape(name), REGEX0))
                    .collect();
                let pairs = format!("(?:{})", pairs.join("|"));
                format!("({}(?:{}{})*)?", pairs, arg, pairs)
            }
        };
        pattern.push_str(&fragment);
    }

    fn on_match(&self, matched: Option<(&str, usize)>, out: &mut MatchedValues) {
        let start = matched.map(|(_, start)| start);
        let text = matched.map(|(text, _)| text).unwrap_or_default();
        let var = &self.vars[0].0;

        match self.kind {
            OperatorKind::Neg | OperatorKind::Opt => {}
            OperatorKind::Prefix | OperatorKind::Suffix if text.is_empty() => {
                out.put_single(var, None, start);
            }
            OperatorKind::Prefix => {
                // the piece before the first separator is always empty
                let pieces: Vec<&str> = text.split(self.arg.as_str()).skip(1).collect();
                out.put_all(var, pieces, start);
            }
            OperatorKind::Suffix => {
                // the piece after the last separator is always empty
                let mut pieces: Vec<&str> = text.split(self.arg.as_str()).collect();
                pieces.pop();
                out.put_all(var, pieces, start);
            }
            OperatorKind::List if text.is_empty() => {
                out.put_single(var, Some(""), start);
            }
            OperatorKind::List => {
                let pieces: Vec<&str> = text.split(self.arg.as_str()).collect();
                out.put_all(var, pieces, start);
            }
            OperatorKind::Join => {
                let pairs: Vec<(&str, &str)> = if text.is_empty() {
                    Vec::new()
                } else {
                    text.split(self.arg.as_str())
                        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
                        .collect()
                };
                for (name, _) in &self.vars {
                    let value = pairs
                        .iter()
                        .rev()
                        .find(|(key, _)| key == name)
                        .map(|(_, value)| *value);
                    out.put_single(name, value, start);
                }
            }
        }
    }

    fn expand(
        &self,
        values: &MultivaluedMap<String>,
        encode: bool,
        out: &mut String,
    ) -> Result<()> {
        match self.kind {
            OperatorKind::Neg => {
                if !self.any_bound(values) {
                    out.push_str(&self.arg);
                }
            }
            OperatorKind::Opt => {
                if self.any_bound(values) {
                    out.push_str(&self.arg);
                }
            }
            OperatorKind::Prefix => {
                for value in self.values_of(&self.vars[0], values) {
                    out.push_str(&self.arg);
                    out.push_str(&encoded(value, encode));
                }
            }
            OperatorKind::Suffix => {
                for value in self.values_of(&self.vars[0], values) {
                    out.push_str(&encoded(value, encode));
                    out.push_str(&self.arg);
                }
            }
            OperatorKind::List => {
                let list: Vec<Cow<'_, str>> = self
                    .values_of(&self.vars[0], values)
                    .into_iter()
                    .map(|value| encoded(value, encode))
                    .collect();
                out.push_str(&list.join(&self.arg));
            }
            OperatorKind::Join => {
                let mut delim: &str = "";
                for var in &self.vars {
                    let list = self.values_of(var, values);
                    if list.len() > 1 {
                        return Err(TemplateError::JoinArity {
                            name: var.0.clone(),
                            count: list.len(),
                        });
                    }
                    if let Some(value) = list.first() {
                        out.push_str(delim);
                        out.push_str(&var.0);
                        out.push('=');
                        out.push_str(&encoded(value, encode));
                        delim = self.arg.as_str();
                    }
                }
            }
        }
        Ok(())
    }
}

fn encoded(value: &str, encode: bool) -> Cow<'_, str> {
    if encode {
        Cow::Owned(codec::encode(value))
    } else {
        Cow::Borrowed(value)
    }
}

/// Rewrite every capturing group of a user supplied regular expression as a
/// non-capturing one, so the global group numbering stays predictable.
///
/// `a(b)*c` becomes `a(?:b)*c` and `(?P<x>a+)` becomes `(?:a+)`. Escaped
/// parentheses and parentheses inside character classes are left alone.
pub(crate) fn convert_groups_to_non_capturing(regex: &str) -> String {
    let chars: Vec<char> = regex.chars().collect();
    let mut out = String::with_capacity(regex.len() + 8);
    let mut in_class = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        out.push(ch);
        i += 1;
        match ch {
            '\\' => {
                if let Some(&escaped) = chars.get(i) {
                    out.push(escaped);
                    i += 1;
                }
            }
            '[' if !in_class => {
                in_class = true;
                // a `]` opening the class, after an optional `^`, is literal
                if chars.get(i) == Some(&'^') {
                    out.push('^');
                    i += 1;
                }
                if chars.get(i) == Some(&']') {
                    out.push(']');
                    i += 1;
                }
            }
            ']' if in_class => in_class = false,
            '(' if !in_class => {
                if chars.get(i) != Some(&'?') {
                    out.push_str("?:");
                } else if let Some(len) = named_group_prefix(&chars[i..]) {
                    out.push_str("?:");
                    i += len;
                }
            }
            _ => {}
        }
    }

    out
}

// Length of a `?P<name>` or `?<name>` group prefix, if `rest` starts with one
fn named_group_prefix(rest: &[char]) -> Option<usize> {
    let name_start = match (rest.get(1), rest.get(2)) {
        (Some('P'), Some('<')) => 3,
        (Some('<'), Some(c)) if *c != '=' && *c != '!' => 2,
        _ => return None,
    };
    let close = rest[name_start..].iter().position(|&c| c == '>')?;
    Some(name_start + close + 1)
}
