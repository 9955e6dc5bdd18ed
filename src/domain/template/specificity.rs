// Route precedence between templates

use std::cmp::Ordering;

use super::compiler::Template;
use crate::config::Dialect;

/// Order two templates by specificity, most specific first.
///
/// More literal characters win, then more distinct variables. Between two
/// simple-dialect templates, more variables with their own regular
/// expression win last. `Ordering::Less` means `a` is more specific, so
/// `templates.sort_by(compare_specificity)` puts the best candidate first.
pub fn compare_specificity(a: &Template, b: &Template) -> Ordering {
    b.literal_chars()
        .cmp(&a.literal_chars())
        .then_with(|| b.variable_count().cmp(&a.variable_count()))
        .then_with(|| {
            if a.dialect() == Dialect::Simple && b.dialect() == Dialect::Simple {
                b.explicit_regexes().cmp(&a.explicit_regexes())
            } else {
                Ordering::Equal
            }
        })
}
