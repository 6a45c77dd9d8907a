//! Route patterns such as `users/{id}/roles`.
//!
//! A pattern is a `/`-separated list of segments. A segment is either a
//! literal matched exactly or a `{name}` variable that matches any single
//! non-empty segment and binds its value. Leading, trailing and repeated
//! slashes carry no meaning.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

use crate::context::VariableVec;
use crate::error::RouterError;

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\{([A-Za-z_][A-Za-z0-9_.\-]*)\}$").expect("variable pattern is valid")
});

/// One segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Variable(Arc<str>),
}

/// A parsed route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a pattern. Fails on unbalanced braces or malformed variable names.
    pub fn parse(pattern: &str) -> Result<Self, RouterError> {
        let mut segments = Vec::new();
        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(caps) = VARIABLE.captures(raw) {
                segments.push(Segment::Variable(Arc::from(&caps[1])));
            } else if raw.contains(['{', '}']) {
                return Err(RouterError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: format!("malformed template segment '{raw}'"),
                });
            } else {
                segments.push(Segment::Literal(raw.to_string()));
            }
        }
        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of literal characters, separators excluded
    #[must_use]
    pub fn literal_len(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => l.chars().count(),
                Segment::Variable(_) => 0,
            })
            .sum()
    }

    /// Literal characters before the first variable, separators excluded
    #[must_use]
    pub fn literal_prefix_len(&self) -> usize {
        self.segments
            .iter()
            .map_while(|s| match s {
                Segment::Literal(l) => Some(l.chars().count()),
                Segment::Variable(_) => None,
            })
            .sum()
    }

    #[must_use]
    pub fn variable_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Variable(_)))
            .count()
    }

    /// Match the template against the first `self.len()` path segments,
    /// appending bound variables to `variables`.
    ///
    /// Returns `false` (leaving `variables` untouched) if the path is too
    /// short or any segment differs.
    pub fn match_prefix(&self, path: &[&str], variables: &mut VariableVec) -> bool {
        if path.len() < self.segments.len() {
            return false;
        }
        let mark = variables.len();
        for (segment, value) in self.segments.iter().zip(path) {
            match segment {
                Segment::Literal(l) if l == value => {}
                Segment::Variable(name) => variables.push((Arc::clone(name), (*value).to_string())),
                Segment::Literal(_) => {
                    variables.truncate(mark);
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            match segment {
                Segment::Literal(l) => f.write_str(l)?,
                Segment::Variable(v) => write!(f, "{{{v}}}")?,
            }
        }
        Ok(())
    }
}

/// Join two relative paths with a single `/`, ignoring empty parts
pub(crate) fn join_path(base: &str, child: &str) -> String {
    let base = base.trim_matches('/');
    let child = child.trim_matches('/');
    match (base.is_empty(), child.is_empty()) {
        (true, _) => child.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}/{child}"),
    }
}

/// Split a request path into its non-empty segments
pub(crate) fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_normalizes_slashes() {
        let t = UriTemplate::parse("/users//{id}/").unwrap();
        assert_eq!(t.to_string(), "users/{id}");
        assert_eq!(t.len(), 2);
        assert_eq!(t.literal_len(), 5);
        assert_eq!(t.variable_count(), 1);
    }

    #[test]
    fn test_literal_prefix_stops_at_first_variable() {
        let t = UriTemplate::parse("users/{id}/roles").unwrap();
        assert_eq!(t.literal_prefix_len(), 5);
        assert_eq!(t.literal_len(), 10);
        assert_eq!(UriTemplate::parse("{a}/users").unwrap().literal_prefix_len(), 0);
        assert_eq!(UriTemplate::parse("users/roles").unwrap().literal_prefix_len(), 10);
        assert_eq!(UriTemplate::parse("").unwrap().literal_prefix_len(), 0);
    }

    #[test]
    fn test_empty_pattern_is_root() {
        let t = UriTemplate::parse("/").unwrap();
        assert!(t.is_empty());
        assert_eq!(t.to_string(), "");
    }

    #[test]
    fn test_malformed_variable_rejected() {
        for bad in ["users/{id", "users/id}", "users/{}", "users/x{id}", "users/{1d}"] {
            assert!(
                matches!(UriTemplate::parse(bad), Err(RouterError::InvalidPattern { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_match_prefix_binds_variables() {
        let t = UriTemplate::parse("orgs/{org}/users/{id}").unwrap();
        let mut vars = VariableVec::new();
        assert!(t.match_prefix(&["orgs", "acme", "users", "7", "roles"], &mut vars));
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].1, "acme");
        assert_eq!(vars[1].1, "7");
    }

    #[test]
    fn test_failed_match_leaves_variables_untouched() {
        let t = UriTemplate::parse("orgs/{org}/teams").unwrap();
        let mut vars = VariableVec::new();
        assert!(!t.match_prefix(&["orgs", "acme", "users"], &mut vars));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "users"), "users");
        assert_eq!(join_path("/api/", "/users"), "api/users");
        assert_eq!(join_path("api", ""), "api");
    }
}
