//! Hub configuration.
//!
//! Every option has a default, so a hub can be built without any
//! configuration at all. Options can be loaded from JSON, and read or written
//! by name at runtime; names the hub doesn't know are kept in `extras` for the
//! application's own use.

use crate::error::{HubError, Result};
use mime::Mime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Log every request and the route it was dispatched to.
    pub log: bool,
    /// Let handler failures propagate out of `dispatch` instead of answering 500.
    pub raise_errors: bool,
    /// Include the failure detail in 500 bodies.
    pub error_detail: bool,
    /// Content type of fresh responses.
    pub content_type: String,
    pub not_found_template: String,
    pub template_dir: PathBuf,
    /// Route template the static file handler is registered under.
    pub static_url: String,
    pub static_root: PathBuf,
    /// Directory relative paths are resolved against.
    pub base_dir: PathBuf,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            log: true,
            raise_errors: false,
            error_detail: true,
            content_type: mime::TEXT_HTML.to_string(),
            not_found_template: "404.html".to_owned(),
            template_dir: PathBuf::from("./templates/"),
            static_url: "/static/*:file/".to_owned(),
            static_root: PathBuf::from("./static/"),
            base_dir: PathBuf::from("."),
            extras: BTreeMap::new(),
        }
    }
}

impl HubConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(HubError::config)
    }

    /// The configured content type of fresh responses.
    pub fn mime(&self) -> Result<Mime> {
        self.content_type.parse::<Mime>().map_err(|e| HubError::config(format!("content_type '{}': {e}", self.content_type)))
    }

    /// Reads an option by name, known and extra options alike.
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => map.remove(key),
            _ => None,
        }
    }

    /// Writes an option by name.
    ///
    /// Known options are type checked; on failure the configuration is left unchanged.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        let mut map = match serde_json::to_value(&*self).map_err(HubError::config)? {
            Value::Object(map) => map,
            _ => return Err(HubError::config("configuration must serialize to an object")),
        };
        map.insert(key.to_owned(), value);
        *self = serde_json::from_value(Value::Object(map)).map_err(|e| HubError::config(format!("option '{key}': {e}")))?;
        Ok(())
    }

    /// Resolves `path` against `base_dir` unless it's absolute.
    pub fn resolve(&self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if path.is_absolute() { path } else { self.base_dir.join(path) }
    }
}

#[cfg(test)]
mod tests {
    use super::HubConfig;
    use serde_json::json;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let config = HubConfig::default();
        assert!(config.log);
        assert!(!config.raise_errors);
        assert_eq!(config.mime().unwrap(), mime::TEXT_HTML);
        assert_eq!(config.static_url, "/static/*:file/");
        assert_eq!(config.not_found_template, "404.html");
    }

    #[test]
    fn test_from_json_keeps_extras() {
        let config = HubConfig::from_json_str(r#"{"log": false, "content_type": "text/plain", "db_type": "sqlite"}"#).unwrap();
        assert!(!config.log);
        assert_eq!(config.mime().unwrap(), mime::TEXT_PLAIN);
        assert_eq!(config.extras["db_type"], json!("sqlite"));
        assert_eq!(config.template_dir, PathBuf::from("./templates/"));
    }

    #[test]
    fn test_get_and_set() {
        let mut config = HubConfig::default();
        assert_eq!(config.get("error_detail"), Some(json!(true)));
        assert_eq!(config.get("missing"), None);

        config.set("raise_errors", json!(true)).unwrap();
        assert!(config.raise_errors);

        config.set("dev_port", json!(8000)).unwrap();
        assert_eq!(config.get("dev_port"), Some(json!(8000)));
    }

    #[test]
    fn test_set_rejects_wrong_type() {
        let mut config = HubConfig::default();
        assert!(config.set("log", json!("yes")).is_err());
        assert!(config.log);
    }

    #[test]
    fn test_invalid_mime() {
        let config = HubConfig { content_type: "not a mime".to_owned(), ..HubConfig::default() };
        assert!(config.mime().is_err());
    }

    #[test]
    fn test_resolve() {
        let config = HubConfig { base_dir: PathBuf::from("/app"), ..HubConfig::default() };
        assert_eq!(config.resolve("static"), PathBuf::from("/app/static"));
        assert_eq!(config.resolve("/abs"), PathBuf::from("/abs"));
    }
}
