// URI template engine
//
// Templates are parsed, compiled into an element list plus one regular
// expression, then matched against paths or expanded from values.

mod ast;
mod compiler;
mod expander;
mod matcher;
mod parser;
mod specificity;

pub use ast::{
    CapturingGroup, Literal, MatchedValues, Operator, OperatorKind, TemplateElement, Variable,
};
pub use compiler::Template;
pub use expander::expand_template;
pub use matcher::TemplateMatcher;
pub use parser::{ParsedTemplate, TemplateParser, TemplatePart};
pub use specificity::compare_specificity;
