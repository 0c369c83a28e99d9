//! Route template compiler.
//!
//! A template is a `/`-separated list of segments. Each segment is either
//! matched literally or declares a named capture:
//!
//! | segment   | captures                                   |
//! |-----------|--------------------------------------------|
//! | `:name`   | one path segment, or the rest of the path when last |
//! | `*:name`  | same as `:name`                            |
//! | `w:name`  | one word (`\w+`)                           |
//!
//! A template ending in a placeholder leaves the matcher open after its
//! trailing `/`, so deeper paths still match.
//!
//! # Example
//! ```
//! use micro_hub::route::Pattern;
//!
//! let pattern = Pattern::compile("/users/*:id/").unwrap();
//! let params = pattern.captures("/users/42/").unwrap();
//! assert_eq!(params.get("id"), Some("42"));
//! assert!(pattern.captures("/users/").is_none());
//! ```

use crate::error::PatternError;
use crate::PathParams;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<tag>.)?:(?P<name>\w+)$").expect("placeholder grammar must compile"));

/// What a placeholder segment is allowed to capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    Wildcard,
    Word,
}

#[derive(Debug)]
enum Segment<'t> {
    Literal(&'t str),
    Capture { name: &'t str, kind: CaptureKind },
}

impl<'t> Segment<'t> {
    fn parse(segment: &'t str) -> Result<Self, PatternError> {
        let Some(captures) = PLACEHOLDER.captures(segment) else {
            return Ok(Segment::Literal(segment));
        };

        let kind = match captures.name("tag").map(|tag| tag.as_str()) {
            None | Some("*") => CaptureKind::Wildcard,
            Some("w") => CaptureKind::Word,
            Some(other) => {
                let tag = other.chars().next().unwrap_or_default();
                return Err(PatternError::UnknownTag { tag, segment: segment.to_owned() });
            }
        };

        // the name group is mandatory in the grammar
        let name = captures.name("name").map_or("", |name| name.as_str());
        Ok(Segment::Capture { name, kind })
    }
}

/// A compiled route template: an anchored matcher plus its capture names.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    matcher: Regex,
    names: Vec<String>,
}

impl Pattern {
    /// Compiles `template` into an anchored matcher.
    ///
    /// The template is normalized to start and end with `/`. A final
    /// placeholder leaves the matcher open at the end, and a final wildcard may
    /// capture across `/`. Everywhere else a capture stays inside its own
    /// segment, and a template ending in a literal is anchored with `/$`.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let source = normalize(template);

        let segments = source
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(Segment::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let mut buffer = String::with_capacity(source.len() + 16);
        buffer.push('^');
        let mut names = Vec::new();
        let mut open_tail = false;

        for (index, segment) in segments.iter().enumerate() {
            buffer.push('/');
            match *segment {
                Segment::Literal(text) => buffer.push_str(&regex::escape(text)),
                Segment::Capture { name, kind } => {
                    let is_last = index + 1 == segments.len();
                    let class = match kind {
                        CaptureKind::Word => r"\w+",
                        CaptureKind::Wildcard if is_last => ".+",
                        CaptureKind::Wildcard => "[^/]+",
                    };
                    open_tail = is_last;

                    buffer.push_str("(?P<");
                    buffer.push_str(name);
                    buffer.push('>');
                    buffer.push_str(class);
                    buffer.push(')');
                    names.push(name.to_owned());
                }
            }
        }

        buffer.push('/');
        if !open_tail {
            buffer.push('$');
        }

        let matcher = Regex::new(&buffer).map_err(|e| PatternError::Invalid { template: source.clone(), source: e })?;

        Ok(Self { source, matcher, names })
    }

    /// The normalized template this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled matcher.
    pub fn as_regex(&self) -> &Regex {
        &self.matcher
    }

    /// Capture names in template order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[inline]
    pub fn is_match(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Matches `path`, returning a fresh set of named captures.
    pub fn captures(&self, path: &str) -> Option<PathParams> {
        let captures = self.matcher.captures(path)?;
        let params = self
            .matcher
            .capture_names()
            .flatten()
            .filter_map(|name| captures.name(name).map(|value| (name.to_owned(), value.as_str().to_owned())))
            .collect();
        Some(params)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern").field("source", &self.source).field("matcher", &self.matcher.as_str()).finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Makes sure `path` begins and ends with a `/`.
pub(crate) fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 2);
    if !path.starts_with('/') {
        normalized.push('/');
    }
    normalized.push_str(path);
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}
