// Percent-encoding helpers shared by literals, variables and operators

use std::borrow::Cow;

/// Characters allowed verbatim in a path besides the unreserved set
const PATH_SAFE: &str = "!$&'()*+,;=:@/";

/// Percent-encode every character outside the unreserved set.
///
/// Used for variable values, so a `/` inside a value never introduces a new
/// path segment.
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Decode `%XX` escapes.
///
/// Malformed escapes are kept as-is and invalid UTF-8 is replaced, so decoding
/// never fails.
pub fn decode(value: &str) -> String {
    if !value.contains('%') {
        return value.to_string();
    }
    match urlencoding::decode_binary(value.as_bytes()) {
        Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Cow::Owned(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Encode the literal part of a template as a path.
///
/// Path delimiters, existing `%XX` escapes and template braces are preserved
/// so that the result can still be validated and matched verbatim.
pub fn encode_template_literal(literal: &str) -> String {
    let bytes = literal.as_bytes();
    let mut out = String::with_capacity(literal.len());

    for (i, ch) in literal.char_indices() {
        let keep = ch.is_ascii_alphanumeric()
            || matches!(ch, '-' | '.' | '_' | '~' | '{' | '}')
            || PATH_SAFE.contains(ch)
            || (ch == '%' && is_escape(bytes, i));
        if keep {
            out.push(ch);
        } else {
            let mut buf = [0u8; 4];
            out.push_str(&urlencoding::encode(ch.encode_utf8(&mut buf)));
        }
    }

    out
}

fn is_escape(bytes: &[u8], at: usize) -> bool {
    bytes.len() > at + 2 && bytes[at + 1].is_ascii_hexdigit() && bytes[at + 2].is_ascii_hexdigit()
}
