// Matching a compiled template against concrete paths

use once_cell::unsync::OnceCell;
use tracing::trace;

use super::ast::MatchedValues;
use super::compiler::Template;
use crate::codec;
use crate::error::{Result, TemplateError};
use crate::multimap::MultivaluedMap;
use crate::segment::PathSegment;

type Span = (usize, usize);

/// Binds a [`Template`] to one path at a time.
///
/// Variable values are computed on first access and cached until the next
/// call to [`TemplateMatcher::matches`]. Every accessor fails with
/// [`TemplateError::UnmatchedState`] unless the last match succeeded.
#[derive(Debug)]
pub struct TemplateMatcher<'t> {
    template: &'t Template,
    path: String,
    spans: Option<Vec<Option<Span>>>,
    matched: OnceCell<MatchedValues>,
}

impl<'t> TemplateMatcher<'t> {
    pub(crate) fn new(template: &'t Template) -> Self {
        Self {
            template,
            path: String::new(),
            spans: None,
            matched: OnceCell::new(),
        }
    }

    pub fn template(&self) -> &'t Template {
        self.template
    }

    /// Match `path` against the whole template
    pub fn matches(&mut self, path: &str) -> bool {
        self.path = path.to_string();
        self.matched = OnceCell::new();
        self.spans = self.template.regex().captures(path).map(|captures| {
            captures
                .iter()
                .map(|group| group.map(|m| (m.start(), m.end())))
                .collect()
        });

        trace!(
            template = self.template.template(),
            path,
            matched = self.spans.is_some(),
            "match attempt"
        );
        self.spans.is_some()
    }

    /// Match `path` and return its variables, or `None` if it does not match
    pub fn match_path(
        &mut self,
        path: &str,
        decode: bool,
    ) -> Option<MultivaluedMap<Option<String>>> {
        if !self.matches(path) {
            return None;
        }
        self.get_variables(decode).ok()
    }

    /// Whether the tail of the last match is empty or a lone slash
    pub fn is_exact_match(&self) -> Result<bool> {
        let tail = self.group(self.template.tail_group())?;
        Ok(tail.is_empty() || tail == "/")
    }

    /// The part of the path left over after the template
    pub fn get_tail(&self, decode: bool) -> Result<String> {
        let tail = self.group(self.template.tail_group())?;
        Ok(decoded(tail, decode))
    }

    /// The part of the path covered by the template.
    ///
    /// When the template ends with `/` and the tail is exactly `/`, the slash
    /// belongs to the head.
    pub fn get_head(&self, decode: bool) -> Result<String> {
        let mut head = decoded(self.group(self.template.head_group())?, decode);
        let tail = self.group(self.template.tail_group())?;
        if self.template.template().ends_with('/') && tail == "/" {
            head.push('/');
        }
        Ok(head)
    }

    /// All variables of the last match, including unbound (`None`) entries
    pub fn get_variables(&self, decode: bool) -> Result<MultivaluedMap<Option<String>>> {
        let matched = self.matched_values()?;
        if !decode {
            return Ok(matched.values().clone());
        }
        Ok(matched
            .values()
            .map_values(|value| value.as_deref().map(codec::decode)))
    }

    /// Bound values of `name`, empty if the variable is unknown or unbound
    pub fn get_variable_values(&self, name: &str, decode: bool) -> Result<Vec<String>> {
        let matched = self.matched_values()?;
        let values = matched.values().get(name).unwrap_or_default();
        Ok(values
            .iter()
            .flatten()
            .map(|value| decoded(value, decode))
            .collect())
    }

    /// First bound value of `name`
    pub fn get_variable_value(&self, name: &str, decode: bool) -> Result<Option<String>> {
        Ok(self
            .get_variable_values(name, decode)?
            .into_iter()
            .next())
    }

    /// Map every bound variable value onto the path segments it spans.
    ///
    /// `segments` must come from the matched path, split on `/` without the
    /// leading slash; only `segments[offset..offset + count]` is considered.
    /// Offsets are counted on the raw segments, so matrix parameters in the
    /// matched path keep their place in the arithmetic.
    pub fn store_variables_path_segments(
        &self,
        segments: &[PathSegment],
        offset: usize,
        count: usize,
    ) -> Result<MultivaluedMap<Vec<PathSegment>>> {
        let matched = self.matched_values()?;
        let bound = offset.saturating_add(count).min(segments.len());
        let mut out = MultivaluedMap::new();

        for (name, values) in matched.values().iter() {
            let starts = matched.starts().get(name).unwrap_or_default();
            for (i, value) in values.iter().enumerate() {
                let (Some(value), Some(Some(start))) = (value, starts.get(i).copied()) else {
                    continue;
                };
                out.add(name, spanned_segments(segments, offset, bound, start, value.len()));
            }
        }

        Ok(out)
    }

    fn group(&self, id: usize) -> Result<&str> {
        let spans = self.spans.as_ref().ok_or(TemplateError::UnmatchedState)?;
        Ok(spans
            .get(id)
            .copied()
            .flatten()
            .map_or("", |(start, end)| &self.path[start..end]))
    }

    fn matched_values(&self) -> Result<&MatchedValues> {
        let spans = self.spans.as_ref().ok_or(TemplateError::UnmatchedState)?;
        Ok(self.matched.get_or_init(|| self.collect_values(spans)))
    }

    fn collect_values(&self, spans: &[Option<Span>]) -> MatchedValues {
        let mut out = MatchedValues::default();
        let elements = self.template.elements();

        for (_, indices) in self.template.variable_groups().iter() {
            for &index in indices {
                let Some(group) = elements[index].as_capturing_group() else {
                    continue;
                };
                let matched = spans
                    .get(group.capturing_group_id())
                    .copied()
                    .flatten()
                    .map(|(start, end)| (&self.path[start..end], start));
                group.on_match(matched, &mut out);
            }
        }

        out
    }
}

// Segments covered by the value starting at byte `start` with length `len`
fn spanned_segments(
    segments: &[PathSegment],
    offset: usize,
    bound: usize,
    start: usize,
    len: usize,
) -> Vec<PathSegment> {
    let mut path_len = 0;

    for index in offset..bound {
        path_len += segments[index].raw_len();
        if start < path_len {
            let end = (start + len).saturating_sub(1);
            let mut last = index;
            while end > path_len && last + 1 < bound {
                last += 1;
                // +1 for the slash between segments
                path_len += segments[last].raw_len() + 1;
            }
            return segments[index..=last].to_vec();
        } else if start == path_len {
            // nothing but matrix parameters or an empty value
            return vec![segments[index].clone()];
        }
        path_len += 1;
    }

    Vec::new()
}

fn decoded(value: &str, decode: bool) -> String {
    if decode {
        codec::decode(value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Dialect;
    use crate::segment::split_path;

    fn simple(template: &str) -> Template {
        Template::compile(template, Dialect::Simple).unwrap()
    }

    fn extended(template: &str) -> Template {
        Template::compile(template, Dialect::Extended).unwrap()
    }

    #[test]
    fn test_accessors_fail_before_match() {
        let template = simple("/widgets/{id}");
        let matcher = template.matcher();
        assert!(matches!(
            matcher.get_variable_values("id", true),
            Err(TemplateError::UnmatchedState)
        ));
        assert!(matcher.get_tail(true).is_err());
        assert!(matcher.get_head(true).is_err());
        assert!(matcher.is_exact_match().is_err());
    }

    #[test]
    fn test_accessors_fail_after_unsuccessful_match() {
        let template = simple("/widgets/{id}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/widgets/1"));
        assert!(!matcher.matches("/gadgets/1"));
        assert!(matches!(
            matcher.get_variables(false),
            Err(TemplateError::UnmatchedState)
        ));
    }

    #[test]
    fn test_head_and_tail() {
        let template = simple("/widgets/{id}");
        let mut matcher = template.matcher();

        assert!(matcher.matches("/widgets/1/sub"));
        assert!(!matcher.is_exact_match().unwrap());
        assert_eq!(matcher.get_head(true).unwrap(), "/widgets/1");
        assert_eq!(matcher.get_tail(true).unwrap(), "/sub");

        assert!(matcher.matches("/widgets/1"));
        assert!(matcher.is_exact_match().unwrap());
        assert_eq!(matcher.get_tail(true).unwrap(), "");
    }

    #[test]
    fn test_head_takes_trailing_slash_when_template_has_one() {
        let template = simple("/widgets/{id}/");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/widgets/1/"));
        assert!(matcher.is_exact_match().unwrap());
        assert_eq!(matcher.get_head(false).unwrap(), "/widgets/1/");

        let template = simple("/widgets/{id}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/widgets/1/"));
        assert_eq!(matcher.get_head(false).unwrap(), "/widgets/1");
    }

    #[test]
    fn test_root_template_takes_any_tail() {
        let template = simple("");
        let mut matcher = template.matcher();
        assert!(matcher.matches("hello"));
        assert_eq!(matcher.get_tail(false).unwrap(), "hello");
        assert!(matcher.matches(""));
        assert!(matcher.is_exact_match().unwrap());
    }

    #[test]
    fn test_tail_decoding() {
        let template = simple("/a");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/a/b%20c"));
        assert_eq!(matcher.get_tail(false).unwrap(), "/b%20c");
        assert_eq!(matcher.get_tail(true).unwrap(), "/b c");
    }

    #[test]
    fn test_variable_values_and_decoding() {
        let template = simple("/users/{name}/{id: \\d+}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/users/j%20doe/42"));
        assert_eq!(
            matcher.get_variable_value("name", true).unwrap(),
            Some("j doe".to_string())
        );
        assert_eq!(
            matcher.get_variable_values("name", false).unwrap(),
            vec!["j%20doe"]
        );
        assert_eq!(
            matcher.get_variable_value("id", true).unwrap(),
            Some("42".to_string())
        );
        assert!(matcher.get_variable_values("missing", true).unwrap().is_empty());
        assert!(!matcher.matches("/users/j/abc"));
    }

    #[test]
    fn test_repeated_variable_collects_all_values() {
        let template = simple("/{a}/{b}/{a}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/1/2/3"));
        assert_eq!(matcher.get_variable_values("a", true).unwrap(), vec!["1", "3"]);
    }

    #[test]
    fn test_match_path() {
        let template = simple("/widgets/{id}");
        let mut matcher = template.matcher();
        let vars = matcher.match_path("/widgets/7", false).unwrap();
        assert_eq!(vars.get("id").unwrap(), &[Some("7".to_string())]);
        assert!(matcher.match_path("/nope", false).is_none());
    }

    #[test]
    fn test_cached_values_reset_on_new_match() {
        let template = simple("/widgets/{id}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/widgets/1"));
        assert_eq!(matcher.get_variable_values("id", true).unwrap(), vec!["1"]);
        assert!(matcher.matches("/widgets/2"));
        assert_eq!(matcher.get_variable_values("id", true).unwrap(), vec!["2"]);
    }

    #[test]
    fn test_join_operator_keeps_unbound_entries() {
        let template = extended("/q{-opt|?|a,b}{-join|&|a,b}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/q?a=1"));
        let vars = matcher.get_variables(false).unwrap();
        assert_eq!(vars.get("a").unwrap(), &[Some("1".to_string())]);
        assert_eq!(vars.get("b").unwrap(), &[None]);
        assert!(matcher.get_variable_values("b", false).unwrap().is_empty());
    }

    #[test]
    fn test_prefix_operator_match() {
        let template = extended("/files{-prefix|/|path}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("/files/a/b"));
        assert_eq!(
            matcher.get_variable_values("path", false).unwrap(),
            vec!["a", "b"]
        );
        assert_eq!(matcher.get_tail(false).unwrap(), "");

        assert!(matcher.matches("/files"));
        let vars = matcher.get_variables(false).unwrap();
        assert_eq!(vars.get("path").unwrap(), &[None]);
    }

    #[test]
    fn test_path_segments_single() {
        let template = simple("a/{x}/b");
        let mut matcher = template.matcher();
        let path = "a/1/b";
        assert!(matcher.matches(path));
        let segments = split_path(path);
        let spans = matcher
            .store_variables_path_segments(&segments, 0, segments.len())
            .unwrap();
        let x = spans.get("x").unwrap();
        assert_eq!(x.len(), 1);
        assert_eq!(x[0], vec![PathSegment::new("1")]);
    }

    #[test]
    fn test_path_segments_spanning() {
        let template = simple("{p: .+}/edit");
        let mut matcher = template.matcher();
        let path = "x/y/edit";
        assert!(matcher.matches(path));
        let segments = split_path(path);
        let spans = matcher
            .store_variables_path_segments(&segments, 0, segments.len())
            .unwrap();
        assert_eq!(
            spans.get_first("p").unwrap(),
            &vec![PathSegment::new("x"), PathSegment::new("y")]
        );
    }

    #[test]
    fn test_path_segments_out_of_range_count_is_clamped() {
        let template = simple("a/{x}");
        let mut matcher = template.matcher();
        assert!(matcher.matches("a/1"));
        let segments = split_path("a/1");
        let spans = matcher
            .store_variables_path_segments(&segments, 0, 10)
            .unwrap();
        assert_eq!(spans.get_first("x").unwrap(), &vec![PathSegment::new("1")]);
    }

    #[test]
    fn test_path_segments_after_matrix_parameters() {
        let template = simple("cars/{make}/{model}");
        let mut matcher = template.matcher();
        let path = "cars/audi;x=1/a4";
        assert!(matcher.matches(path));
        let segments = split_path(path);
        let spans = matcher
            .store_variables_path_segments(&segments, 0, segments.len())
            .unwrap();

        let make = spans.get_first("make").unwrap();
        assert_eq!(make, &vec![PathSegment::parse("audi;x=1")]);
        assert_eq!(make[0].path(), "audi");
        assert_eq!(spans.get_first("model").unwrap(), &vec![PathSegment::new("a4")]);
    }

    #[test]
    fn test_path_segments_spanning_matrix_parameters() {
        let template = simple("{p: .+}/edit");
        let mut matcher = template.matcher();
        let path = "x;v=2/y/edit";
        assert!(matcher.matches(path));
        let segments = split_path(path);
        let spans = matcher
            .store_variables_path_segments(&segments, 0, segments.len())
            .unwrap();
        assert_eq!(
            spans.get_first("p").unwrap(),
            &vec![PathSegment::parse("x;v=2"), PathSegment::new("y")]
        );
    }
}
