//! The raw gateway environment a server adapter hands to the hub.
//!
//! Besides CGI-style string variables (`DOCUMENT_URI`, `REQUEST_URI`,
//! `HTTP_USER_AGENT`, ...) an [`Environ`] carries the query string and the form
//! body already split into `name -> values` maps.

use crate::error::{HubError, Result};
use std::collections::BTreeMap;

/// Request path without the query string.
pub const DOCUMENT_URI: &str = "DOCUMENT_URI";
/// Request target as sent by the client, query string included.
pub const REQUEST_URI: &str = "REQUEST_URI";
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";
pub const QUERY_STRING: &str = "QUERY_STRING";
/// Raw urlencoded form body.
pub const POST_DATA: &str = "POST_DATA";
pub const HTTP_USER_AGENT: &str = "HTTP_USER_AGENT";
/// Literal header spelling, used by adapters that pass headers through untouched.
pub const USER_AGENT: &str = "User-Agent";

/// Parameters keyed by name, each keeping every value in arrival order.
pub type MultiMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environ {
    vars: BTreeMap<String, String>,
    query: MultiMap,
    form: MultiMap,
}

impl Environ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var(key, value);
        self
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sets the already split query parameters.
    pub fn with_query(mut self, query: MultiMap) -> Self {
        self.query = query;
        self
    }

    /// Sets the already split form parameters.
    pub fn with_form(mut self, form: MultiMap) -> Self {
        self.form = form;
        self
    }

    /// Parses a raw query string and stores both the raw value and the split parameters.
    pub fn with_query_string(mut self, raw: &str) -> Result<Self> {
        self.query = parse_urlencoded(raw)?;
        self.vars.insert(QUERY_STRING.to_owned(), raw.to_owned());
        Ok(self)
    }

    /// Parses a raw urlencoded form body and stores both the raw value and the split parameters.
    pub fn with_form_data(mut self, raw: &str) -> Result<Self> {
        self.form = parse_urlencoded(raw)?;
        self.vars.insert(POST_DATA.to_owned(), raw.to_owned());
        Ok(self)
    }

    pub fn query(&self) -> &MultiMap {
        &self.query
    }

    pub fn form(&self) -> &MultiMap {
        &self.form
    }
}

/// Splits an `application/x-www-form-urlencoded` string into a [`MultiMap`].
///
/// Repeated keys keep all of their values in order, `+` and percent escapes
/// are decoded.
pub fn parse_urlencoded(raw: &str) -> Result<MultiMap> {
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(raw).map_err(HubError::environ)?;

    let mut map = MultiMap::new();
    for (key, value) in pairs {
        map.entry(key).or_default().push(value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::{parse_urlencoded, Environ, POST_DATA, QUERY_STRING};

    #[test]
    fn test_parse_urlencoded_groups_repeated_keys() {
        let map = parse_urlencoded("a=1&b=x+y&a=2&c=%E2%9C%93").unwrap();
        assert_eq!(map["a"], ["1", "2"]);
        assert_eq!(map["b"], ["x y"]);
        assert_eq!(map["c"], ["✓"]);
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_urlencoded("").unwrap().is_empty());
    }

    #[test]
    fn test_raw_strings_are_kept() {
        let environ = Environ::new().with_query_string("a=1").unwrap().with_form_data("b=2").unwrap();

        assert_eq!(environ.var(QUERY_STRING), Some("a=1"));
        assert_eq!(environ.var(POST_DATA), Some("b=2"));
        assert_eq!(environ.query()["a"], ["1"]);
        assert_eq!(environ.form()["b"], ["2"]);
    }
}
