//! Normalized view of one inbound request.
//!
//! This module contains the types a handler receives for every request:
//! - `Request`: path, method, user agent and the merged input parameters
//! - `PathParams`: named captures produced by the matched route

use crate::environ::{Environ, DOCUMENT_URI, HTTP_USER_AGENT, MultiMap, REQUEST_URI, USER_AGENT};
use http::Method;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// A request parameter: a bare value, or every value when the name was sent more than once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    Single(String),
    Multi(Vec<String>),
}

impl InputValue {
    /// Returns the value when exactly one was sent.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InputValue::Single(value) => Some(value),
            InputValue::Multi(_) => None,
        }
    }

    pub fn first(&self) -> Option<&str> {
        self.values().first().map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        match self {
            InputValue::Single(value) => std::slice::from_ref(value),
            InputValue::Multi(values) => values,
        }
    }

    #[inline]
    pub fn is_multi(&self) -> bool {
        matches!(self, InputValue::Multi(_))
    }
}

/// Represents the state of an inbound request after normalization.
///
/// `path` always ends with a `/`. Input parameters are the query parameters
/// followed by the form parameters, merged per name.
#[derive(Debug, Clone)]
pub struct Request {
    environ: Environ,
    path: String,
    full_path: String,
    method: Method,
    user_agent: String,
    input: BTreeMap<String, InputValue>,
}

impl Request {
    /// Builds a request routed at `path`, which is normalized to end with `/`.
    pub fn new(path: &str, method: Method, environ: Environ) -> Self {
        let path = ensure_trailing_slash(path);
        let full_path = environ.var(REQUEST_URI).map_or_else(|| path.clone(), str::to_owned);
        let user_agent = environ.var(HTTP_USER_AGENT).or_else(|| environ.var(USER_AGENT)).unwrap_or_default().to_owned();
        let input = merge_input(environ.query(), environ.form());

        Self { environ, path, full_path, method, user_agent, input }
    }

    /// Builds a request from the path the environment carries, `/` when there is none.
    pub fn from_environ(method: Method, environ: Environ) -> Self {
        let path = environ.var(DOCUMENT_URI).unwrap_or("/").to_owned();
        Self::new(&path, method, environ)
    }

    /// The raw environment this request was built from.
    pub fn environ(&self) -> &Environ {
        &self.environ
    }

    /// Looks up a raw environment variable.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.environ.var(key)
    }

    /// The request path without query string, always ending with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request target including the query string.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The user agent, empty when the client didn't send one.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Gets a merged input parameter by name.
    pub fn input(&self, name: &str) -> Option<&InputValue> {
        self.input.get(name)
    }

    pub fn inputs(&self) -> &BTreeMap<String, InputValue> {
        &self.input
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.full_path)
    }
}

pub(crate) fn ensure_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_owned()
    } else {
        let mut owned = String::with_capacity(path.len() + 1);
        owned.push_str(path);
        owned.push('/');
        owned
    }
}

/// Concatenates the values of both sources per name, then collapses single values.
fn merge_input(query: &MultiMap, form: &MultiMap) -> BTreeMap<String, InputValue> {
    let mut merged = query.clone();
    for (name, values) in form {
        merged.entry(name.clone()).or_default().extend(values.iter().cloned());
    }

    merged
        .into_iter()
        .filter_map(|(name, mut values)| match values.len() {
            0 => None,
            1 => values.pop().map(|value| (name, InputValue::Single(value))),
            _ => Some((name, InputValue::Multi(values))),
        })
        .collect()
}

/// Named captures extracted from the request path by the matched route.
///
/// A fresh value is produced for every match, so captures never outlive the
/// request they were taken from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: Vec<(String, String)>,
}

impl PathParams {
    /// Creates an empty PathParams instance with no parameters
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Gets the value of a path parameter by its name
    /// Returns None if the parameter doesn't exist
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.params.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl FromIterator<(String, String)> for PathParams {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { params: iter.into_iter().collect() }
    }
}
