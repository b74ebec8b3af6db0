//! JSON backend: a tree of JSON values rooted at an object.
//!
//! Files are written pretty-printed with two-space indentation, keys in
//! insertion order, and no HTML escaping.
//!
//! JSON has no NaN or infinity: non-finite floats are stored as `null`, the
//! same way `serde_json` serializes them, and read back as the default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Config, FileConfig, Format};
use crate::error::{BoxError, CommonsError};
use crate::path::{self, KeyPath, Tree};

/// The JSON [`Format`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Json;

pub type JsonConfig = FileConfig<Json>;

impl Format for Json {
    type Document = Map<String, Value>;

    const NAME: &'static str = "json";

    fn parse(input: &str) -> Result<Self::Document, BoxError> {
        if input.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(input)? {
            Value::Object(map) => Ok(map),
            other => Err(format!("expected an object at the root, found {}", kind(&other)).into()),
        }
    }

    fn render(document: &Self::Document) -> Result<String, BoxError> {
        Ok(serde_json::to_string_pretty(document)?)
    }
}

impl Tree for Map<String, Value> {
    type Value = Value;

    fn child(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }

    fn child_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.get_mut(key)
    }

    fn put(&mut self, key: &str, value: Value) {
        self.insert(key.to_string(), value);
    }

    fn as_tree(value: &Value) -> Option<&Self> {
        value.as_object()
    }

    fn as_tree_mut(value: &mut Value) -> Option<&mut Self> {
        value.as_object_mut()
    }

    fn empty_tree() -> Value {
        Value::Object(Map::new())
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode `value` as `T`, or `None` (logged) when it doesn't fit.
fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(key, error = %e, "value doesn't decode, using default");
            None
        }
    }
}

impl Config for FileConfig<Json> {
    fn get(&self, key: &str, default: &str) -> Result<String, CommonsError> {
        KeyPath::parse(key)?;
        let text = match self.document.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        };
        Ok(text.unwrap_or_else(|| default.to_string()))
    }

    fn get_as<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, CommonsError> {
        KeyPath::parse(key)?;
        Ok(self
            .document
            .get(key)
            .and_then(|value| decode(key, value))
            .unwrap_or(default))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CommonsError> {
        self.set_value(key, value)
    }

    /// Non-finite floats are stored as `null`.
    fn set_value<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), CommonsError> {
        let path = KeyPath::parse(key)?;
        let value = serde_json::to_value(value).map_err(|e| CommonsError::InvalidValue {
            key: key.into(),
            reason: e.to_string(),
        })?;
        if !path::insert(&mut self.document, &path, value) {
            warn!(key, "path is blocked by a non-object value, write ignored");
            return Ok(());
        }
        self.after_mutation()
    }

    fn at<T: DeserializeOwned>(&self, path: &str, default: T) -> Result<Option<T>, CommonsError> {
        let path = KeyPath::parse(path)?;
        let Some(value) = path::lookup(&self.document, &path)? else {
            return Ok(None);
        };
        Ok(Some(decode(path.as_str(), value).unwrap_or(default)))
    }

    fn objects_supported(&self) -> bool {
        true
    }

    fn saving_supported(&self) -> bool {
        self.source_is_writable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Persistent;
    use crate::fixtures::test::{Window, sample_window};
    use crate::source::FileSource;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn config_with(value: Value) -> JsonConfig {
        let mut config = JsonConfig::new();
        if let Value::Object(map) = value {
            for (k, v) in map {
                config.set_value(&k, &v).unwrap();
            }
        }
        config
    }

    #[test]
    fn nested_write_builds_objects() {
        let mut config = JsonConfig::new();
        config.set_value("a.b.c", &42).unwrap();

        assert_eq!(
            Value::Object(config.document().clone()),
            json!({"a": {"b": {"c": 42}}})
        );
        assert_eq!(config.at("a.b.c", 0).unwrap(), Some(42));
        let inner: Option<Map<String, Value>> = config.at("a.b", Map::new()).unwrap();
        assert!(inner.is_some_and(|m| m.contains_key("c")));
    }

    #[test]
    fn blocked_write_is_silent_noop() {
        let mut config = config_with(json!({"a": 1}));
        config.set_value("a.b", &2).unwrap();
        assert_eq!(Value::Object(config.document().clone()), json!({"a": 1}));
    }

    #[test]
    fn blocked_write_skips_auto_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let mut config = config_with(json!({"a": 1}));
        config.bind(FileSource::new(&path));

        config.set_value("a.b", &2).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn mismatched_read_names_segment() {
        let config = config_with(json!({"a": "s"}));
        match config.at::<String>("a.b", "d".into()) {
            Err(CommonsError::TypeMismatch { segment, .. }) => assert_eq!(segment, "a"),
            other => panic!("Expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn missing_parent_is_none_not_default() {
        let config = config_with(json!({"x": 1}));
        assert_eq!(config.at("a.b.c", 7).unwrap(), None);
    }

    #[test]
    fn missing_leaf_is_none() {
        let config = config_with(json!({"a": {"b": 1}}));
        assert_eq!(config.at("a.c", 7).unwrap(), None);
    }

    #[test]
    fn undecodable_leaf_is_default() {
        let config = config_with(json!({"a": {"b": "not a number"}}));
        assert_eq!(config.at("a.b", 7).unwrap(), Some(7));
    }

    #[test]
    fn at_single_segment() {
        let config = config_with(json!({"port": 8080}));
        assert_eq!(config.at("port", 0u16).unwrap(), Some(8080));
    }

    #[test]
    fn at_rejects_empty_segments() {
        let config = JsonConfig::new();
        assert!(matches!(
            config.at("a..b", 0),
            Err(CommonsError::InvalidPath { .. })
        ));
        assert!(matches!(
            config.at("", 0),
            Err(CommonsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn set_rejects_empty_key() {
        let mut config = JsonConfig::new();
        assert!(matches!(
            config.set("", "v"),
            Err(CommonsError::InvalidPath { .. })
        ));
    }

    #[test]
    fn get_defaults_when_absent() {
        let config = JsonConfig::new();
        assert_eq!(config.get("k", "d").unwrap(), "d");
        assert_eq!(config.get_as("k", 5).unwrap(), 5);
    }

    #[test]
    fn get_does_not_traverse() {
        let mut config = JsonConfig::new();
        config.set_value("a.b", "nested").unwrap();
        assert_eq!(config.get("a.b", "top-level only").unwrap(), "top-level only");
    }

    #[test]
    fn get_renders_scalars_as_text() {
        let config = config_with(json!({"n": 3, "b": true, "o": {"x": 1}}));
        assert_eq!(config.get("n", "").unwrap(), "3");
        assert_eq!(config.get("b", "").unwrap(), "true");
        assert_eq!(config.get("o", "d").unwrap(), "d");
    }

    #[test]
    fn get_as_undecodable_is_default() {
        let config = config_with(json!({"k": "text"}));
        assert_eq!(config.get_as("k", 9).unwrap(), 9);
    }

    #[test]
    fn records_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let window = sample_window();

        let mut config = JsonConfig::new().with_source(FileSource::new(&path));
        config.set_value("window", &window).unwrap();
        config.set_value("ui.main", &window).unwrap();

        let reloaded = JsonConfig::open(FileSource::new(&path)).unwrap();
        assert_eq!(
            reloaded.get_as("window", Window::default()).unwrap(),
            window
        );
        assert_eq!(
            reloaded.at("ui.main", Window::default()).unwrap(),
            Some(window)
        );
    }

    #[test]
    fn scalars_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = JsonConfig::new()
            .with_source(FileSource::new(&path))
            .with_auto_save(false);
        config.set("s", "hello <b> & = world").unwrap();
        config.set_value("i", &-12i64).unwrap();
        config.set_value("f", &2.5f64).unwrap();
        config.set_value("b", &true).unwrap();
        config.set_value("list", &vec!["x", "y"]).unwrap();
        config.save().unwrap();
        config.load().unwrap();

        assert_eq!(config.get_as("s", String::new()).unwrap(), "hello <b> & = world");
        assert_eq!(config.get_as("i", 0i64).unwrap(), -12);
        assert_eq!(config.get_as("f", 0.0f64).unwrap(), 2.5);
        assert!(config.get_as("b", false).unwrap());
        assert_eq!(
            config.get_as("list", Vec::<String>::new()).unwrap(),
            vec!["x".to_string(), "y".to_string()]
        );
    }

    #[test]
    fn non_finite_floats_store_null() {
        let mut config = JsonConfig::new();
        config.set_value("ratio", &f64::NAN).unwrap();
        config.set_value("limit", &f64::INFINITY).unwrap();

        assert_eq!(config.document().get("ratio"), Some(&Value::Null));
        assert_eq!(config.document().get("limit"), Some(&Value::Null));
        assert_eq!(config.get_as("ratio", 0.5).unwrap(), 0.5);
        assert_eq!(config.at::<Option<f64>>("limit", Some(1.0)).unwrap(), Some(None));
    }

    #[test]
    fn output_is_pretty_ordered_and_unescaped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let mut config = JsonConfig::new().with_source(FileSource::new(&path));
        config.set("zeta", "<&>").unwrap();
        config.set("alpha", "=").unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"zeta\": \"<&>\",\n  \"alpha\": \"=\"\n}");
    }

    #[test]
    fn parse_rejects_non_object_root() {
        assert!(Json::parse("[1, 2]").is_err());
        assert!(Json::parse("{}").unwrap().is_empty());
        assert!(Json::parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn capabilities() {
        let config = JsonConfig::new();
        assert!(config.objects_supported());
    }
}
