//! Template string resolution.
//!
//! Every `{...}` span in a template is a placeholder. A placeholder is either
//! `{key}` or `{key:format}`. A body naming a known variable is taken whole,
//! so keys may contain `:`; otherwise the format is split off at the first `:`.
//! Resolution is all-or-nothing: the first unknown key, malformed brace or
//! invalid format fails the whole call and no partial output is returned.

use crate::result::{RegistroError, RegistroResult};
use crate::variables::{VariableRegistry, VariableValue};
use chrono::format::{Item, StrftimeItems};
use std::fmt::Write as _;
use tracing::debug;

/// A parsed piece of a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied to the output unchanged
    Literal(&'a str),
    /// Variable reference
    Placeholder {
        /// Text between the braces
        body: &'a str,
        /// Variable key
        key: &'a str,
        /// Optional format specifier
        format: Option<&'a str>,
    },
}

/// Split a template into literal and placeholder segments.
pub fn parse(template: &str) -> RegistroResult<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;
    let mut offset = 0;

    while !rest.is_empty() {
        let next_close = rest.find('}');
        let Some(open) = rest.find('{') else {
            if let Some(close) = next_close {
                return Err(stray_close(template, offset + close));
            }
            segments.push(Segment::Literal(rest));
            break;
        };
        if let Some(close) = next_close.filter(|close| *close < open) {
            return Err(stray_close(template, offset + close));
        }

        if open > 0 {
            segments.push(Segment::Literal(&rest[..open]));
        }
        let body_start = open + 1;
        let Some(len) = rest[body_start..].find(&['{', '}'][..]) else {
            return Err(malformed(
                template,
                format!("unclosed '{{' at position {}", offset + open),
            ));
        };
        let end = body_start + len;
        if rest.as_bytes()[end] == b'{' {
            return Err(malformed(
                template,
                format!("nested '{{' at position {}", offset + end),
            ));
        }

        let body = &rest[body_start..end];
        let (key, format) = match body.split_once(':') {
            Some((key, format)) => (key, Some(format)),
            None => (body, None),
        };
        segments.push(Segment::Placeholder { body, key, format });

        offset += end + 1;
        rest = &rest[end + 1..];
    }

    Ok(segments)
}

fn stray_close(template: &str, position: usize) -> RegistroError {
    malformed(template, format!("unexpected '}}' at position {position}"))
}

fn malformed(template: &str, message: String) -> RegistroError {
    RegistroError::MalformedTemplate {
        template: template.to_string(),
        message,
    }
}

/// Render a single value with an optional format specifier.
pub fn format_value(key: &str, value: &VariableValue, format: Option<&str>) -> RegistroResult<String> {
    let invalid = |message: &str| RegistroError::InvalidFormat {
        key: key.to_string(),
        format: format.unwrap_or_default().to_string(),
        message: message.to_string(),
    };

    match (value, format) {
        (value, None) => Ok(value.to_string()),
        (VariableValue::Text(text), Some(format)) => {
            if !format.contains('*') {
                return Err(invalid("text values only accept affix formats containing '*'"));
            }
            if text.is_empty() {
                Ok(String::new())
            } else {
                Ok(format.replace('*', text))
            }
        }
        (VariableValue::DateTime(dt), Some(format)) => {
            let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
            if items.iter().any(|item| matches!(item, Item::Error)) {
                return Err(invalid("not a valid strftime format"));
            }
            let mut out = String::new();
            write!(out, "{}", dt.format_with_items(items.into_iter()))
                .map_err(|_| invalid("date/time could not be rendered"))?;
            Ok(out)
        }
    }
}

/// Resolves `{key}` placeholders against a [`VariableRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct TemplateResolver<'a> {
    variables: &'a VariableRegistry,
}

impl<'a> TemplateResolver<'a> {
    /// Create a resolver over a registry
    #[must_use]
    pub const fn new(variables: &'a VariableRegistry) -> Self {
        Self { variables }
    }

    /// Resolve every placeholder in `template`.
    ///
    /// # Errors
    ///
    /// - [`RegistroError::UnresolvedPlaceholder`] naming the first unknown key
    /// - [`RegistroError::MalformedTemplate`] for unbalanced braces
    /// - [`RegistroError::InvalidFormat`] for a format the value cannot take
    pub fn resolve(&self, template: &str) -> RegistroResult<String> {
        let segments = parse(template)?;
        let mut out = String::with_capacity(template.len());

        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { body, key, format } => {
                    if let Some(value) = format.and_then(|_| self.variables.try_get(body)) {
                        out.push_str(&format_value(body, &value, None)?);
                        continue;
                    }
                    let value = self.variables.try_get(key).ok_or_else(|| {
                        RegistroError::UnresolvedPlaceholder {
                            key: key.to_string(),
                            template: template.to_string(),
                        }
                    })?;
                    out.push_str(&format_value(key, &value, format)?);
                }
            }
        }

        debug!(template, resolved = %out, "Resolved template");
        Ok(out)
    }
}
