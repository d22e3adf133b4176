//! Positional `%s` / `%d` substitution for pattern route templates.

use crate::error::RouteError;
use regex::Captures;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Str,
    Int,
}

/// A route template compiled once at registration time.
#[derive(Debug, Clone)]
pub(crate) struct Template {
    source: String,
    parts: Vec<Part>,
}

impl Template {
    /// Parse `template`; `%%` is a literal percent sign.
    pub(crate) fn parse(template: &str) -> Result<Self, RouteError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let directive = match chars.next() {
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some('s') => Part::Str,
                Some('d') => Part::Int,
                Some(other) => {
                    return Err(RouteError::UnknownDirective {
                        template: template.to_string(),
                        directive: other,
                    })
                }
                None => {
                    return Err(RouteError::IncompleteDirective {
                        template: template.to_string(),
                    })
                }
            };
            if !literal.is_empty() {
                parts.push(Part::Literal(std::mem::take(&mut literal)));
            }
            parts.push(directive);
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            parts,
        })
    }

    pub(crate) fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn directive_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| !matches!(p, Part::Literal(_)))
            .count()
    }

    /// Substitute capture groups 1..=n, left to right.
    pub(crate) fn expand(&self, pattern: &str, caps: &Captures<'_>) -> Result<String, RouteError> {
        let mut out = String::with_capacity(self.source.len() + 16);
        let mut index = 0;
        for part in &self.parts {
            match part {
                Part::Literal(s) => out.push_str(s),
                Part::Str => {
                    index += 1;
                    out.push_str(caps.get(index).map_or("", |m| m.as_str()));
                }
                Part::Int => {
                    index += 1;
                    let raw = caps.get(index).map_or("", |m| m.as_str());
                    let value = canonical_integer(raw).ok_or_else(|| RouteError::NotAnInteger {
                        pattern: pattern.to_string(),
                        index,
                        value: raw.to_string(),
                    })?;
                    out.push_str(&value);
                }
            }
        }
        Ok(out)
    }
}

/// Decimal integer of any length without leading zeros or a `+` sign.
fn canonical_integer(raw: &str) -> Option<String> {
    let (negative, digits) = match raw.as_bytes().first()? {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(match (trimmed.is_empty(), negative) {
        (true, _) => "0".to_string(),
        (false, true) => format!("-{trimmed}"),
        (false, false) => trimmed.to_string(),
    })
}
