//! Version specifier parsing.
//!
//! A version is kept as its raw string on every [`ProjectVersionRef`](super::ProjectVersionRef)
//! and parsed on demand, so that relationships with unparsable versions can be
//! skipped at insertion time instead of failing at construction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Meta-versions that always need external resolution.
const META_VERSIONS: [&str; 2] = ["LATEST", "RELEASE"];

/// One bounded interval of a version range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRange {
    /// Lower bound, `None` when unbounded
    pub lower: Option<String>,
    /// Whether the lower bound is part of the range
    pub lower_inclusive: bool,
    /// Upper bound, `None` when unbounded
    pub upper: Option<String>,
    /// Whether the upper bound is part of the range
    pub upper_inclusive: bool,
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let open = if self.lower_inclusive { '[' } else { '(' };
        let close = if self.upper_inclusive { ']' } else { ')' };
        match (&self.lower, &self.upper) {
            (Some(lo), Some(hi)) if lo == hi && self.lower_inclusive && self.upper_inclusive => {
                write!(f, "[{lo}]")
            }
            (lo, hi) => write!(
                f,
                "{open}{},{}{close}",
                lo.as_deref().unwrap_or(""),
                hi.as_deref().unwrap_or("")
            ),
        }
    }
}

/// Parsed form of a version string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionSpec {
    /// A single concrete version (`1.2.3`, `2.0-SNAPSHOT`)
    Single(String),
    /// A union of one or more ranges (`[1.0,2.0)`, `(,1.0],[1.2,)`)
    Range(Vec<VersionRange>),
    /// A property placeholder (`${project.version}`)
    Expression(String),
    /// A meta-version such as `LATEST` or `RELEASE`
    Meta(String),
}

impl VersionSpec {
    /// Parse a raw version string.
    ///
    /// # Errors
    ///
    /// Returns the reason as a string; callers wrap it into
    /// [`GraphError::InvalidVersion`](crate::GraphError::InvalidVersion) with coordinate context.
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        if raw.is_empty() {
            return Err("empty version".to_string());
        }
        if raw.chars().any(char::is_whitespace) {
            return Err("version contains whitespace".to_string());
        }
        if raw.contains('|') {
            return Err("version contains reserved character '|'".to_string());
        }

        if let Some(start) = raw.find("${") {
            return match raw[start..].find('}') {
                Some(_) => Ok(VersionSpec::Expression(raw.to_string())),
                None => Err("unterminated property expression".to_string()),
            };
        }

        if raw.starts_with('[') || raw.starts_with('(') {
            return parse_ranges(raw).map(VersionSpec::Range);
        }

        if META_VERSIONS.contains(&raw) {
            return Ok(VersionSpec::Meta(raw.to_string()));
        }

        if raw.contains(|c| matches!(c, '[' | ']' | '(' | ')' | ',' | '{' | '}')) {
            return Err("unbalanced range delimiters".to_string());
        }

        Ok(VersionSpec::Single(raw.to_string()))
    }

    /// Whether this spec resolves to exactly one version without outside help.
    pub fn is_concrete(&self) -> bool {
        matches!(self, VersionSpec::Single(_))
    }

    /// Whether this is a snapshot version.
    pub fn is_snapshot(&self) -> bool {
        match self {
            VersionSpec::Single(v) => v.ends_with("-SNAPSHOT"),
            _ => false,
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Single(v) | VersionSpec::Expression(v) | VersionSpec::Meta(v) => {
                f.write_str(v)
            }
            VersionSpec::Range(ranges) => {
                let parts: Vec<String> = ranges.iter().map(ToString::to_string).collect();
                f.write_str(&parts.join(","))
            }
        }
    }
}

fn parse_ranges(raw: &str) -> std::result::Result<Vec<VersionRange>, String> {
    let mut ranges = Vec::new();
    let mut rest = raw;

    while !rest.is_empty() {
        let lower_inclusive = match rest.as_bytes()[0] {
            b'[' => true,
            b'(' => false,
            _ => return Err(format!("expected '[' or '(' at '{rest}'")),
        };
        let close = rest
            .find([']', ')'])
            .ok_or_else(|| "unterminated range".to_string())?;
        let upper_inclusive = rest.as_bytes()[close] == b']';
        let body = &rest[1..close];
        if body.contains(['[', '(']) {
            return Err("nested range delimiters".to_string());
        }

        let range = match body.split_once(',') {
            None => {
                if body.is_empty() || !lower_inclusive || !upper_inclusive {
                    return Err(format!("invalid exact-version range '{}'", &rest[..=close]));
                }
                VersionRange {
                    lower: Some(body.to_string()),
                    lower_inclusive: true,
                    upper: Some(body.to_string()),
                    upper_inclusive: true,
                }
            }
            Some((lo, hi)) => {
                if hi.contains(',') {
                    return Err("too many bounds in range".to_string());
                }
                if lo.is_empty() && hi.is_empty() {
                    return Err("range has no bounds".to_string());
                }
                VersionRange {
                    lower: (!lo.is_empty()).then(|| lo.to_string()),
                    lower_inclusive,
                    upper: (!hi.is_empty()).then(|| hi.to_string()),
                    upper_inclusive,
                }
            }
        };
        ranges.push(range);

        rest = &rest[close + 1..];
        if let Some(next) = rest.strip_prefix(',') {
            if next.is_empty() {
                return Err("trailing ',' after range".to_string());
            }
            rest = next;
        } else if !rest.is_empty() {
            return Err(format!("unexpected trailing input '{rest}'"));
        }
    }

    Ok(ranges)
}
