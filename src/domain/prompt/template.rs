//! Prompt templates with `{field}` placeholders.
//!
//! Syntax follows the familiar format-string convention: `{name}` is a
//! placeholder, `{{` and `}}` are literal braces. Placeholder names are
//! identifiers; anything else is rejected when the template is parsed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::TemplateError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parses a template, failing on unbalanced braces or bad placeholder names.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        let segments = parse_segments(&source)?;
        Ok(Self { source, segments })
    }

    /// The original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct placeholder names, in first-use order.
    pub fn fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Field(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// True if the template references `field`.
    pub fn references(&self, field: &str) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::Field(name) if name == field))
    }

    /// Substitutes every placeholder; a placeholder without a value is an error.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> Result<String, TemplateError> {
        let mut rendered = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => rendered.push_str(text),
                Segment::Field(name) => {
                    let value = values
                        .get(name.as_str())
                        .ok_or_else(|| TemplateError::missing_value(name))?;
                    rendered.push_str(value);
                }
            }
        }
        Ok(rendered)
    }
}

impl TryFrom<String> for PromptTemplate {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PromptTemplate::parse(value)
    }
}

impl From<PromptTemplate> for String {
    fn from(template: PromptTemplate) -> Self {
        template.source
    }
}

fn parse_segments(source: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if matches!(chars.peek(), Some((_, '{'))) {
                    chars.next();
                    literal.push('{');
                    continue;
                }

                let mut name = String::new();
                let mut closed = false;
                for (_, inner) in chars.by_ref() {
                    if inner == '}' {
                        closed = true;
                        break;
                    }
                    name.push(inner);
                }
                if !closed {
                    return Err(TemplateError::UnbalancedBrace { position });
                }
                if !is_identifier(&name) {
                    return Err(TemplateError::InvalidPlaceholder { placeholder: name });
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Field(name));
            }
            '}' => {
                if matches!(chars.peek(), Some((_, '}'))) {
                    chars.next();
                    literal.push('}');
                } else {
                    return Err(TemplateError::UnbalancedBrace { position });
                }
            }
            other => literal.push(other),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&'static str, &str)]) -> BTreeMap<&'static str, String> {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn renders_placeholders() {
        let template = PromptTemplate::parse("Student: {s_response}\nTutor: {t_response}").unwrap();
        let rendered = template
            .render(&values(&[("s_response", "hi"), ("t_response", "hello")]))
            .unwrap();
        assert_eq!(rendered, "Student: hi\nTutor: hello");
    }

    #[test]
    fn double_braces_are_literal() {
        let template = PromptTemplate::parse("{{not_a_field}} [{current_state}]").unwrap();
        assert_eq!(template.fields(), vec!["current_state"]);
        let rendered = template
            .render(&values(&[("current_state", "neutral")]))
            .unwrap();
        assert_eq!(rendered, "{not_a_field} [neutral]");
    }

    #[test]
    fn fields_are_distinct_in_first_use_order() {
        let template = PromptTemplate::parse("{b} {a} {b}").unwrap();
        assert_eq!(template.fields(), vec!["b", "a"]);
        assert!(template.references("a"));
        assert!(!template.references("c"));
    }

    #[test]
    fn unbalanced_braces_fail_to_parse() {
        assert_eq!(
            PromptTemplate::parse("open {field"),
            Err(TemplateError::UnbalancedBrace { position: 5 })
        );
        assert_eq!(
            PromptTemplate::parse("close }"),
            Err(TemplateError::UnbalancedBrace { position: 6 })
        );
    }

    #[test]
    fn non_identifier_placeholder_fails_to_parse() {
        assert!(matches!(
            PromptTemplate::parse("{0}"),
            Err(TemplateError::InvalidPlaceholder { .. })
        ));
        assert!(matches!(
            PromptTemplate::parse("{}"),
            Err(TemplateError::InvalidPlaceholder { .. })
        ));
    }

    #[test]
    fn render_without_value_fails() {
        let template = PromptTemplate::parse("{math_level}").unwrap();
        assert_eq!(
            template.render(&BTreeMap::new()),
            Err(TemplateError::MissingValue {
                field: "math_level".to_string()
            })
        );
    }

    #[test]
    fn template_deserializes_from_string() {
        let template: PromptTemplate = serde_yaml::from_str("\"Say {states}\"").unwrap();
        assert_eq!(template.fields(), vec!["states"]);
    }
}
