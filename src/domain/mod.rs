pub mod template;

pub use template::{compare_specificity, expand_template, Template, TemplateMatcher};
