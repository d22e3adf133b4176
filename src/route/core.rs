use super::template::Template;
use crate::dispatcher::Request;
use crate::error::RouteError;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Programmatic rewrite: receives the current path and the request, returns a
/// replacement path or `None` to leave the path alone.
pub type RewriteFn = Arc<dyn Fn(&str, &Request) -> Option<String> + Send + Sync>;

/// Identity of a rule within a [`RouteTable`].
///
/// A `Literal` key paired with a template matches that exact path. Paired with
/// a rewrite function, any key is only the rule's name. A `Pattern` key is
/// compared by its source text.
#[derive(Clone)]
pub enum RouteKey {
    Literal(String),
    Pattern(Regex),
}

impl RouteKey {
    #[must_use]
    pub fn literal(path: impl Into<String>) -> Self {
        RouteKey::Literal(path.into())
    }

    /// Name for a programmatic rule; same representation as a literal key.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        RouteKey::Literal(name.into())
    }

    /// Compile a pattern key.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if `pattern` is not a valid regex.
    pub fn pattern(pattern: &str) -> Result<Self, RouteError> {
        Regex::new(pattern)
            .map(RouteKey::Pattern)
            .map_err(|source| RouteError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    fn as_str(&self) -> &str {
        match self {
            RouteKey::Literal(s) => s,
            RouteKey::Pattern(re) => re.as_str(),
        }
    }
}

impl PartialEq for RouteKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RouteKey::Literal(a), RouteKey::Literal(b)) => a == b,
            (RouteKey::Pattern(a), RouteKey::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for RouteKey {}

impl fmt::Debug for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteKey::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            RouteKey::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

/// What a rule does when it fires.
#[derive(Clone)]
pub enum RouteTarget {
    /// Replacement path; for pattern keys it may contain `%s`/`%d` directives.
    Template(String),
    Rewrite(RewriteFn),
}

impl fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteTarget::Template(t) => f.debug_tuple("Template").field(t).finish(),
            RouteTarget::Rewrite(_) => f.write_str("Rewrite(<fn>)"),
        }
    }
}

#[derive(Clone)]
struct RouteEntry {
    key: RouteKey,
    target: RouteTarget,
    /// Compiled template for pattern keys.
    compiled: Option<Template>,
}

/// Ordered set of path rewrite rules.
///
/// Every rule gets one chance per request, in registration order, and each
/// rule sees the output of the rules before it. There is no "first match
/// wins": `/a → /b` followed by `/b → /c` rewrites `/a` to `/c`.
#[derive(Clone, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a rule.
    ///
    /// A replaced rule keeps its original position in the table.
    ///
    /// # Errors
    ///
    /// Pattern/template pairs are validated here: unknown directives and a
    /// directive count that differs from the pattern's capture groups are
    /// rejected with a [`RouteError`].
    pub fn set(&mut self, key: RouteKey, target: RouteTarget) -> Result<(), RouteError> {
        let compiled = match (&key, &target) {
            (RouteKey::Pattern(re), RouteTarget::Template(template)) => {
                let compiled = Template::parse(template)?;
                let captures = re.captures_len() - 1;
                if compiled.directive_count() != captures {
                    return Err(RouteError::DirectiveMismatch {
                        pattern: re.as_str().to_string(),
                        template: template.clone(),
                        captures,
                        directives: compiled.directive_count(),
                    });
                }
                Some(compiled)
            }
            _ => None,
        };

        self.upsert(RouteEntry {
            key,
            target,
            compiled,
        });
        Ok(())
    }

    /// Register `from → to` as an exact-string rule.
    pub fn literal(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.upsert(RouteEntry {
            key: RouteKey::literal(from),
            target: RouteTarget::Template(to.into()),
            compiled: None,
        });
        self
    }

    /// Register a regex rule whose captures fill `template`.
    ///
    /// # Errors
    ///
    /// See [`RouteTable::set`].
    pub fn pattern(&mut self, pattern: &str, template: &str) -> Result<&mut Self, RouteError> {
        self.set(
            RouteKey::pattern(pattern)?,
            RouteTarget::Template(template.to_string()),
        )?;
        Ok(self)
    }

    /// Register a named programmatic rule.
    pub fn rewrite<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&str, &Request) -> Option<String> + Send + Sync + 'static,
    {
        self.upsert(RouteEntry {
            key: RouteKey::named(name),
            target: RouteTarget::Rewrite(Arc::new(f)),
            compiled: None,
        });
        self
    }

    fn upsert(&mut self, entry: RouteEntry) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.key == entry.key) {
            warn!(key = %entry.key.as_str(), "Route re-registered - replacing rule");
            *existing = entry;
        } else {
            info!(
                key = %entry.key.as_str(),
                target = ?entry.target,
                position = self.entries.len(),
                "Route registered"
            );
            self.entries.push(entry);
        }
    }

    #[must_use]
    pub fn get(&self, key: &RouteKey) -> Option<&RouteTarget> {
        self.entries
            .iter()
            .find(|e| &e.key == key)
            .map(|e| &e.target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &RouteKey> {
        self.entries.iter().map(|e| &e.key)
    }

    /// Run every rule once, in order, threading the path through them.
    ///
    /// - literal key + template: replaces the path when it equals the key
    /// - pattern key + template: replaces the path with the expanded template on match
    /// - rewrite fn: always consulted, the key only names the rule
    ///
    /// # Errors
    ///
    /// [`RouteError::NotAnInteger`] when a `%d` directive receives a non-numeric capture.
    pub fn apply(&self, path: &str, request: &Request) -> Result<String, RouteError> {
        let mut current = path.to_string();

        for entry in &self.entries {
            let rewritten = match (&entry.key, &entry.target) {
                (RouteKey::Literal(from), RouteTarget::Template(to)) => {
                    (current == *from).then(|| to.clone())
                }
                (RouteKey::Pattern(re), RouteTarget::Template(_)) => {
                    match (re.captures(&current), &entry.compiled) {
                        (Some(caps), Some(template)) => {
                            Some(template.expand(re.as_str(), &caps)?)
                        }
                        _ => None,
                    }
                }
                (_, RouteTarget::Rewrite(f)) => f(&current, request),
            };

            match rewritten {
                Some(next) if !next.is_empty() => {
                    // RW1: Rule applied
                    debug!(
                        rule = %entry.key.as_str(),
                        template = entry.compiled.as_ref().map(Template::source),
                        from = %current,
                        to = %next,
                        "Route rewrite applied"
                    );
                    current = next;
                }
                _ => {}
            }
        }

        Ok(current)
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| (&e.key, &e.target)))
            .finish()
    }
}
