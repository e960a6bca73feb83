//! `{field}` placeholder templates, shared by mail merge and label text blocks.
//!
//! `{{` and `}}` are literal braces. A conversion (`{name!r}`) or format spec
//! (`{name:>10}`) is accepted and ignored; the raw value is substituted.
use std::collections::BTreeSet;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => {
                    return Err(Error::Template(
                        "single '}' encountered in template".to_string(),
                    ));
                }
                '{' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        if c == '{' {
                            return Err(Error::Template(format!(
                                "unexpected '{{' inside placeholder '{{{}'",
                                inner
                            )));
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(Error::Template(
                            "single '{' encountered in template".to_string(),
                        ));
                    }
                    let name = field_name(&inner);
                    if name.is_empty() {
                        return Err(Error::Template(
                            "positional '{}' placeholders are not supported; name the field"
                                .to_string(),
                        ));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(name.to_string()));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Distinct field names referenced by the template
    pub fn fields(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Field(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Substitute every field; `None` from `lookup` fails with the field name
    pub fn render<'a, F>(&self, mut lookup: F) -> std::result::Result<String, String>
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => out.push_str(lookup(name).ok_or_else(|| name.clone())?),
            }
        }
        Ok(out)
    }

    /// Substitute every field, rendering unknown ones as empty text
    pub fn render_lenient<'a, F>(&self, mut lookup: F) -> String
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => out.push_str(lookup(name).unwrap_or("")),
            }
        }
        out
    }
}

fn field_name(inner: &str) -> &str {
    let end = inner.find(['!', ':']).unwrap_or(inner.len());
    inner[..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn collects_fields_and_ignores_specs() {
        let t = Template::parse("Dear {name},\n{amount:>8} due {due!r}. {name}").unwrap();
        let fields: Vec<String> = t.fields().into_iter().collect();
        assert_eq!(fields, vec!["amount", "due", "name"]);
    }

    #[test]
    fn doubled_braces_are_literals() {
        let t = Template::parse("{{literal}} {x}").unwrap();
        let rendered = t.render(|_| Some("1")).unwrap();
        assert_eq!(rendered, "{literal} 1");
        assert!(t.fields().contains("x"));
        assert_eq!(t.fields().len(), 1);
    }

    #[test]
    fn unbalanced_and_positional_placeholders_fail() {
        assert!(Template::parse("oops }").is_err());
        assert!(Template::parse("oops {name").is_err());
        assert!(Template::parse("hello {}").is_err());
    }

    #[test]
    fn strict_render_reports_missing_field() {
        let t = Template::parse("{a}-{b}").unwrap();
        let values = HashMap::from([("a", "1")]);
        assert_eq!(
            t.render(|k| values.get(k).copied()),
            Err("b".to_string())
        );
        assert_eq!(t.render_lenient(|k| values.get(k).copied()), "1-");
    }
}
