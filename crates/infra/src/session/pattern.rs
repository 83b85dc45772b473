//! Shell-style path patterns for endpoints exempt from retries
//!
//! Syntax: `*` matches any run of non-`/` characters, `?` one non-`/`
//! character, `[...]`/`[^...]` a character class with `a-z` ranges, and `\c`
//! the literal `c`. A pattern must match the whole request path.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error in pattern")]
pub struct PatternError;

/// A compiled excluded-endpoint pattern
#[derive(Clone)]
pub struct EndpointPattern {
    source: String,
    regex: Option<Regex>,
}

impl EndpointPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let regex = match translate(pattern)? {
            Some(expr) => Some(Regex::new(&expr).map_err(|_| PatternError)?),
            None => None,
        };
        Ok(Self { source: pattern.to_string(), regex })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        self.regex.as_ref().is_some_and(|re| re.is_match(path))
    }
}

impl fmt::Debug for EndpointPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EndpointPattern").field(&self.source).finish()
    }
}

/// Set of compiled patterns; a path is excluded when any pattern matches
#[derive(Debug, Clone, Default)]
pub struct ExcludedEndpoints {
    patterns: Vec<EndpointPattern>,
}

impl ExcludedEndpoints {
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, (usize, PatternError)> {
        let patterns = patterns
            .iter()
            .enumerate()
            .map(|(index, p)| EndpointPattern::new(p.as_ref()).map_err(|e| (index, e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Regex source for `pattern`, or `None` when it can never match
fn translate(pattern: &str) -> Result<Option<String>, PatternError> {
    let mut out = String::from("^");
    let mut never = false;
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '\\' => push_literal(&mut out, chars.next().ok_or(PatternError)?),
            '[' => match class(&mut chars)? {
                Some(expr) => out.push_str(&expr),
                None => never = true,
            },
            other => push_literal(&mut out, other),
        }
    }
    out.push('$');

    Ok(if never { None } else { Some(out) })
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0u8; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

/// Translate a class body following `[`; `None` when no character can match
fn class(chars: &mut Peekable<Chars<'_>>) -> Result<Option<String>, PatternError> {
    let negated = chars.next_if_eq(&'^').is_some();
    let mut ranges = Vec::new();
    let mut seen = 0usize;

    loop {
        if seen > 0 && chars.next_if_eq(&']').is_some() {
            break;
        }
        let lo = class_char(chars)?;
        let hi = if chars.next_if_eq(&'-').is_some() { class_char(chars)? } else { lo };
        seen += 1;
        if lo <= hi {
            ranges.push((lo, hi));
        }
    }

    if ranges.is_empty() {
        return Ok(if negated { Some("(?s:.)".to_string()) } else { None });
    }

    let mut expr = String::from(if negated { "[^" } else { "[" });
    for (lo, hi) in ranges {
        expr.push_str(&format!("\\x{{{:X}}}-\\x{{{:X}}}", lo as u32, hi as u32));
    }
    expr.push(']');
    Ok(Some(expr))
}

fn class_char(chars: &mut Peekable<Chars<'_>>) -> Result<char, PatternError> {
    match chars.next() {
        None | Some('-' | ']') => Err(PatternError),
        Some('\\') => chars.next().ok_or(PatternError),
        Some(c) => Ok(c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, path: &str) -> bool {
        EndpointPattern::new(pattern).unwrap().matches(path)
    }

    #[test]
    fn test_star_stays_within_segment() {
        let pattern = "/papi/v1/properties/*/versions/*/rules";
        assert!(matches(pattern, "/papi/v1/properties/prp_1/versions/3/rules"));
        assert!(!matches(pattern, "/papi/v1/properties/a/b/versions/3/rules"));
        assert!(matches("/papi/v1/*", "/papi/v1/"));
        assert!(!matches("/papi/v1/*", "/papi/v1/a/b"));
    }

    #[test]
    fn test_question_mark_and_literals() {
        assert!(matches("/v?/maps", "/v1/maps"));
        assert!(!matches("/v?/maps", "/v/maps"));
        assert!(!matches("/v?/maps", "/v//maps"));
        assert!(matches("/a.b+(c)", "/a.b+(c)"));
        assert!(!matches("/a.b", "/axb"));
        assert!(matches(r"/lit\*", "/lit*"));
        assert!(!matches(r"/lit\*", "/litx"));
    }

    #[test]
    fn test_classes() {
        assert!(matches("/v[0-9]/x", "/v7/x"));
        assert!(!matches("/v[0-9]/x", "/va/x"));
        assert!(matches("/v[^0-9]/x", "/va/x"));
        assert!(!matches("/v[^0-9]/x", "/v1/x"));
        assert!(matches(r"/[\]]", "/]"));
        assert!(EndpointPattern::new("/[ab-]").is_err());
    }

    #[test]
    fn test_inverted_range_never_matches() {
        assert!(!matches("/[z-a]", "/m"));
        assert!(matches("/[^z-a]", "/m"));
    }

    #[test]
    fn test_malformed_patterns() {
        for bad in ["[-]", "[]", "[a-", "[abc", r"abc\", r"[\", "[^]"] {
            assert_eq!(EndpointPattern::new(bad).unwrap_err(), PatternError, "{bad}");
        }
    }

    #[test]
    fn test_compile_reports_index() {
        let err = ExcludedEndpoints::compile(&["/ok/*", "[-]"]).unwrap_err();
        assert_eq!(err.0, 1);

        let set = ExcludedEndpoints::compile(&["/papi/v1/search/*", "/siteshield/*"]).unwrap();
        assert!(set.is_excluded("/siteshield/v1"));
        assert!(!set.is_excluded("/papi/v1/rule-formats"));
    }
}
