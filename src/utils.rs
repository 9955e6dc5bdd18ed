// Path normalization applied to templates before compilation

/// Normalize a raw template or path to the form used for compilation.
///
/// `.` segments are dropped and `..` segments remove their parent, then a
/// single leading slash is stripped.
pub fn normalize_uri(uri: &str) -> String {
    let normalized = remove_dot_segments(uri);
    match normalized.strip_prefix('/') {
        Some(rest) => rest.to_string(),
        None => normalized,
    }
}

fn remove_dot_segments(uri: &str) -> String {
    if !uri.split('/').any(|s| s == "." || s == "..") {
        return uri.to_string();
    }

    let (absolute, rest) = match uri.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, uri),
    };

    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());

    for (i, segment) in segments.into_iter().enumerate() {
        match segment {
            "." => {}
            ".." => match out.last() {
                Some(&prev) if prev != ".." => {
                    out.pop();
                }
                _ if !absolute => out.push(".."),
                _ => {}
            },
            other => out.push(other),
        }
        // a trailing dot segment still denotes a directory
        if i == last && (segment == "." || segment == "..") {
            out.push("");
        }
    }

    let joined = out.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}
