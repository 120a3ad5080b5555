//! Placeholder expansion for descriptor values.
//!
//! Values in an environment's `env` and `mounts` mappings may refer to
//! other descriptor fields with `{field}` syntax.
//!
//! # Syntax
//!
//! - `{field}` - replaced with the field's value
//! - `{{` and `}}` - produce literal `{` and `}`
//!
//! # Example
//!
//! ```json
//! "env": { "SHELTER_HOST_DIR": "{directory}" }
//! ```
//!
//! `$VAR` references are left alone; they are expanded by the container
//! runtime, not by Shelter.

use crate::error::{Result, ShelterError};
use std::collections::HashMap;

/// A segment of a templated string.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Literal text
    Literal(String),
    /// Placeholder reference: {name}
    Placeholder(String),
}

/// Parse a string containing `{field}` placeholders.
///
/// An unterminated `{` is kept as literal text.
pub fn parse_placeholders(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut chars = input.chars().peekable();
    let mut current_literal = String::new();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                current_literal.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                current_literal.push('}');
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }

                if closed {
                    if !current_literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut current_literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                } else {
                    current_literal.push('{');
                    current_literal.push_str(&name);
                }
            }
            _ => current_literal.push(c),
        }
    }

    if !current_literal.is_empty() {
        segments.push(Segment::Literal(current_literal));
    }

    segments
}

/// Expand every placeholder in `input` from `fields`.
///
/// # Errors
///
/// Returns `UnknownPlaceholder` if a placeholder names no field.
pub fn expand(input: &str, fields: &HashMap<String, String>) -> Result<String> {
    let mut result = String::with_capacity(input.len());

    for segment in parse_placeholders(input) {
        match segment {
            Segment::Literal(text) => result.push_str(&text),
            Segment::Placeholder(name) => {
                let value = fields
                    .get(&name)
                    .ok_or_else(|| ShelterError::UnknownPlaceholder {
                        placeholder: name.clone(),
                        value: input.to_string(),
                    })?;
                result.push_str(value);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> HashMap<String, String> {
        HashMap::from([
            ("name".to_string(), "dev".to_string()),
            ("directory".to_string(), "/base/dev".to_string()),
        ])
    }

    #[test]
    fn parse_literal_only() {
        let result = parse_placeholders("/shelter/host");
        assert_eq!(result, vec![Segment::Literal("/shelter/host".to_string())]);
    }

    #[test]
    fn parse_placeholder_with_surrounding_text() {
        let result = parse_placeholders("{directory}/host");
        assert_eq!(
            result,
            vec![
                Segment::Placeholder("directory".to_string()),
                Segment::Literal("/host".to_string()),
            ]
        );
    }

    #[test]
    fn parse_doubled_braces_are_literal() {
        let result = parse_placeholders("{{name}}");
        assert_eq!(result, vec![Segment::Literal("{name}".to_string())]);
    }

    #[test]
    fn parse_unterminated_brace_is_literal() {
        let result = parse_placeholders("a{b");
        assert_eq!(result, vec![Segment::Literal("a{b".to_string())]);
    }

    #[test]
    fn dollar_references_are_untouched() {
        let result = expand("$HOME/.Xauthority", &fields()).unwrap();
        assert_eq!(result, "$HOME/.Xauthority");
    }

    #[test]
    fn expand_replaces_fields() {
        let result = expand("{directory}/host/{name}", &fields()).unwrap();
        assert_eq!(result, "/base/dev/host/dev");
    }

    #[test]
    fn expand_fails_on_unknown_field() {
        let err = expand("{missing}", &fields()).unwrap_err();
        match err {
            ShelterError::UnknownPlaceholder { placeholder, value } => {
                assert_eq!(placeholder, "missing");
                assert_eq!(value, "{missing}");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
