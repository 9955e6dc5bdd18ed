// Template parser using recursive descent
//
// Simple dialect:   "{" WSP name WSP [ ":" WSP regex WSP ] "}"
//                   regex = *( nonbrace / "{" *nonbrace "}" )
// Extended dialect: "{" ( var / "-" op "|" arg "|" var *( "," var ) ) "}"
//                   var = name [ "=" default ]

use crate::config::Dialect;
use crate::error::{Result, TemplateError};

/// A piece of template text recognized by the parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart<'a> {
    Literal(&'a str),
    Variable {
        name: &'a str,
        regex: Option<&'a str>,
        default: Option<&'a str>,
    },
    Operator {
        name: &'a str,
        arg: &'a str,
        vars: Vec<(&'a str, Option<&'a str>)>,
    },
}

/// Parser output: every part up to the last expression, then the trailing literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate<'a> {
    pub parts: Vec<TemplatePart<'a>>,
    pub trailing: &'a str,
}

pub struct TemplateParser<'a> {
    input: &'a str,
    pos: usize,
    dialect: Dialect,
}

impl<'a> TemplateParser<'a> {
    pub fn parse(template: &'a str, dialect: Dialect) -> Result<ParsedTemplate<'a>> {
        let mut parser = Self {
            input: template,
            pos: 0,
            dialect,
        };
        parser.parse_template()
    }

    fn parse_template(&mut self) -> Result<ParsedTemplate<'a>> {
        let mut parts = Vec::new();
        let mut literal_start = 0;

        while let Some(ch) = self.peek_char() {
            match ch {
                '{' => {
                    let literal = self.slice(literal_start, self.pos);
                    let part = match self.dialect {
                        Dialect::Simple => self.parse_simple_variable()?,
                        Dialect::Extended => self.parse_expansion()?,
                    };
                    if !literal.is_empty() {
                        parts.push(TemplatePart::Literal(literal));
                    }
                    parts.push(part);
                    literal_start = self.pos;
                }
                '}' => return Err(self.error("Unexpected closing brace")),
                _ => self.pos += ch.len_utf8(),
            }
        }

        Ok(ParsedTemplate {
            parts,
            trailing: self.slice(literal_start, self.input.len()),
        })
    }

    fn parse_simple_variable(&mut self) -> Result<TemplatePart<'a>> {
        self.expect_char('{')?;
        self.skip_whitespace();
        let name = self.parse_variable_name()?;
        self.skip_whitespace();

        let mut regex = None;
        if self.peek_char() == Some(':') {
            self.pos += 1;
            self.skip_whitespace();
            let start = self.pos;
            self.skip_regex()?;
            let text = self
                .slice(start, self.pos)
                .trim_end_matches(|c: char| c == ' ' || c == '\t');
            if !text.is_empty() {
                regex = Some(text);
            }
        }

        self.expect_char('}')?;
        Ok(TemplatePart::Variable {
            name,
            regex,
            default: None,
        })
    }

    // Stops in front of the closing brace of the variable
    fn skip_regex(&mut self) -> Result<()> {
        while let Some(ch) = self.peek_char() {
            match ch {
                '}' => return Ok(()),
                '{' => {
                    self.pos += 1;
                    loop {
                        match self.peek_char() {
                            Some('}') => {
                                self.pos += 1;
                                break;
                            }
                            Some('{') => {
                                return Err(self.error("Nested braces in regular expression"))
                            }
                            Some(c) => self.pos += c.len_utf8(),
                            None => {
                                return Err(self.error("Unterminated brace in regular expression"))
                            }
                        }
                    }
                }
                _ => self.pos += ch.len_utf8(),
            }
        }
        Err(self.error("Unterminated variable"))
    }

    fn parse_expansion(&mut self) -> Result<TemplatePart<'a>> {
        self.expect_char('{')?;
        let part = if self.peek_char() == Some('-') {
            self.pos += 1;
            self.parse_operator()?
        } else {
            let (name, default) = self.parse_var()?;
            TemplatePart::Variable {
                name,
                regex: None,
                default,
            }
        };
        self.expect_char('}')?;
        Ok(part)
    }

    fn parse_operator(&mut self) -> Result<TemplatePart<'a>> {
        let start = self.pos;
        while matches!(self.peek_char(), Some(ch) if ch.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("Expected operator name"));
        }
        let name = self.slice(start, self.pos);

        self.expect_char('|')?;
        let start = self.pos;
        self.skip_chars(is_arg_char)?;
        let arg = self.slice(start, self.pos);
        self.expect_char('|')?;

        let mut vars = vec![self.parse_var()?];
        while self.peek_char() == Some(',') {
            self.pos += 1;
            vars.push(self.parse_var()?);
        }

        Ok(TemplatePart::Operator { name, arg, vars })
    }

    fn parse_var(&mut self) -> Result<(&'a str, Option<&'a str>)> {
        let name = self.parse_variable_name()?;
        if self.peek_char() != Some('=') {
            return Ok((name, None));
        }
        self.pos += 1;
        let start = self.pos;
        self.skip_chars(is_unreserved)?;
        Ok((name, Some(self.slice(start, self.pos))))
    }

    fn parse_variable_name(&mut self) -> Result<&'a str> {
        let start = self.pos;
        match self.peek_char() {
            Some(ch) if is_word(ch) => self.pos += 1,
            Some(ch) => {
                return Err(self.error(format!("Invalid character '{}' in variable name", ch)))
            }
            None => return Err(self.error("Expected variable name but found end of input")),
        }
        while let Some(ch) = self.peek_char() {
            if is_word(ch) || ch == '.' || ch == '-' {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.slice(start, self.pos))
    }

    // Consumes accepted characters and well-formed %XX escapes
    fn skip_chars(&mut self, accept: fn(char) -> bool) -> Result<()> {
        while let Some(ch) = self.peek_char() {
            if ch == '%' {
                let bytes = self.input.as_bytes();
                let hex = |i: usize| matches!(bytes.get(i), Some(b) if b.is_ascii_hexdigit());
                if !(hex(self.pos + 1) && hex(self.pos + 2)) {
                    return Err(self.error("Malformed percent escape"));
                }
                self.pos += 3;
            } else if accept(ch) {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        Ok(())
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_char(), Some(' ') | Some('\t')) {
            self.pos += 1;
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn expect_char(&mut self, expected: char) -> Result<()> {
        match self.peek_char() {
            Some(ch) if ch == expected => {
                self.pos += ch.len_utf8();
                Ok(())
            }
            Some(ch) => Err(self.error(format!("Expected '{}' but found '{}'", expected, ch))),
            None => Err(self.error(format!("Expected '{}' but found end of input", expected))),
        }
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        let input = self.input;
        &input[start..end]
    }

    fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::grammar(
            self.input,
            format!("{} at position {}", message.into(), self.pos),
        )
    }
}

fn is_word(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_unreserved(ch: char) -> bool {
    is_word(ch) || matches!(ch, '.' | '!' | '~' | '*' | '\'' | '(' | ')' | '-')
}

fn is_arg_char(ch: char) -> bool {
    is_unreserved(ch) || matches!(ch, ';' | '/' | '?' | ':' | '@' | '&' | '=' | '+' | '$' | ',')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple(template: &str) -> ParsedTemplate<'_> {
        TemplateParser::parse(template, Dialect::Simple).unwrap()
    }

    fn extended(template: &str) -> ParsedTemplate<'_> {
        TemplateParser::parse(template, Dialect::Extended).unwrap()
    }

    #[test]
    fn test_parse_simple_variable() {
        let parsed = simple("/widgets/{id}/parts");
        assert_eq!(
            parsed.parts,
            vec![
                TemplatePart::Literal("/widgets/"),
                TemplatePart::Variable {
                    name: "id",
                    regex: None,
                    default: None
                },
            ]
        );
        assert_eq!(parsed.trailing, "/parts");
    }

    #[test]
    fn test_parse_variable_with_regex_and_whitespace() {
        let parsed = simple("{ id : \\d+ }");
        match &parsed.parts[0] {
            TemplatePart::Variable { name, regex, .. } => {
                assert_eq!(*name, "id");
                assert_eq!(*regex, Some("\\d+"));
            }
            _ => panic!("Expected variable"),
        }
        assert_eq!(parsed.trailing, "");
    }

    #[test]
    fn test_parse_regex_with_counted_repetition() {
        let parsed = simple("/{year:\\d{4}}/{slug}");
        let names: Vec<_> = parsed
            .parts
            .iter()
            .filter_map(|part| match part {
                TemplatePart::Variable { name, regex, .. } => Some((*name, *regex)),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec![("year", Some("\\d{4}")), ("slug", None)]);
    }

    #[test]
    fn test_parse_empty_regex_is_unconstrained() {
        let parsed = simple("{id:}");
        assert_eq!(
            parsed.parts[0],
            TemplatePart::Variable {
                name: "id",
                regex: None,
                default: None
            }
        );
    }

    #[test]
    fn test_parse_dotted_and_dashed_names() {
        let parsed = simple("{a.b-c_d}");
        match &parsed.parts[0] {
            TemplatePart::Variable { name, .. } => assert_eq!(*name, "a.b-c_d"),
            _ => panic!("Expected variable"),
        }
    }

    #[test]
    fn test_parse_unexpected_closing_brace_fails() {
        let result = TemplateParser::parse("/a}b", Dialect::Simple);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Unexpected closing brace"));
    }

    #[test]
    fn test_parse_unterminated_variable_fails() {
        assert!(TemplateParser::parse("/{id", Dialect::Simple).is_err());
        assert!(TemplateParser::parse("/{id:[a-z]", Dialect::Simple).is_err());
        assert!(TemplateParser::parse("/{}", Dialect::Simple).is_err());
    }

    #[test]
    fn test_parse_extended_variable_with_default() {
        let parsed = extended("/search/{term=rust%20lang}");
        assert_eq!(
            parsed.parts[1],
            TemplatePart::Variable {
                name: "term",
                regex: None,
                default: Some("rust%20lang")
            }
        );
    }

    #[test]
    fn test_parse_operator() {
        let parsed = extended("/items/{-join|&|a,b=2}");
        assert_eq!(
            parsed.parts[1],
            TemplatePart::Operator {
                name: "join",
                arg: "&",
                vars: vec![("a", None), ("b", Some("2"))],
            }
        );
    }

    #[test]
    fn test_parse_operator_with_reserved_arg() {
        let parsed = extended("{-opt|?verbose=1|flag}");
        match &parsed.parts[0] {
            TemplatePart::Operator { name, arg, vars } => {
                assert_eq!(*name, "opt");
                assert_eq!(*arg, "?verbose=1");
                assert_eq!(vars.len(), 1);
            }
            _ => panic!("Expected operator"),
        }
    }

    #[test]
    fn test_parse_extended_rejects_regex_syntax() {
        assert!(TemplateParser::parse("{id:\\d+}", Dialect::Extended).is_err());
    }

    #[test]
    fn test_parse_malformed_operator_fails() {
        assert!(TemplateParser::parse("{-|,|a}", Dialect::Extended).is_err());
        assert!(TemplateParser::parse("{-list,|a}", Dialect::Extended).is_err());
        assert!(TemplateParser::parse("{-list|,|}", Dialect::Extended).is_err());
        assert!(TemplateParser::parse("{-list|%zz|a}", Dialect::Extended).is_err());
    }
}
