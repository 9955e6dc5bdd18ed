// Slash-delimited path segments

use crate::multimap::MultivaluedMap;

/// One segment of a request path, with its matrix parameters split off.
///
/// `"cars;color=red;used"` has the path `"cars"` and the matrix parameters
/// `color=red` and `used=""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    path: String,
    matrix: MultivaluedMap<String>,
    raw_len: usize,
}

impl PathSegment {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            matrix: MultivaluedMap::new(),
            raw_len: path.len(),
        }
    }

    /// Parse a raw segment, splitting matrix parameters on `;`
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.split(';');
        let path = parts.next().unwrap_or_default();
        let mut matrix = MultivaluedMap::new();

        for param in parts.filter(|p| !p.is_empty()) {
            match param.split_once('=') {
                Some((name, value)) => matrix.add(name, value.to_string()),
                None => matrix.add(param, String::new()),
            }
        }

        Self {
            path: path.to_string(),
            matrix,
            raw_len: raw.len(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn matrix_parameters(&self) -> &MultivaluedMap<String> {
        &self.matrix
    }

    /// Byte length of the segment as written, matrix parameters included
    pub fn raw_len(&self) -> usize {
        self.raw_len
    }
}

/// Split a path into its segments, ignoring one leading slash
pub fn split_path(path: &str) -> Vec<PathSegment> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').map(PathSegment::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_segment() {
        let segment = PathSegment::parse("widgets");
        assert_eq!(segment.path(), "widgets");
        assert!(segment.matrix_parameters().is_empty());
    }

    #[test]
    fn test_parse_matrix_parameters() {
        let segment = PathSegment::parse("cars;color=red;used;;size=1=2");
        assert_eq!(segment.path(), "cars");
        let matrix = segment.matrix_parameters();
        assert_eq!(matrix.get_first("color").map(String::as_str), Some("red"));
        assert_eq!(matrix.get_first("used").map(String::as_str), Some(""));
        assert_eq!(matrix.get_first("size").map(String::as_str), Some("1=2"));
        assert_eq!(matrix.len(), 3);
        assert_eq!(segment.raw_len(), "cars;color=red;used;;size=1=2".len());
    }

    #[test]
    fn test_split_path() {
        let segments = split_path("/a/b;x=1/c");
        let paths: Vec<&str> = segments.iter().map(PathSegment::path).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_path_keeps_trailing_empty_segment() {
        let segments = split_path("a/b/");
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[2].path(), "");
    }
}
