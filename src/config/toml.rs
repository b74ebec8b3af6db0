//! TOML backend: the same nested-object semantics as JSON over a TOML table.
//!
//! TOML has no null, so values that don't encode to TOML (`None`, unit) are
//! rejected with [`CommonsError::InvalidValue`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use ::toml::{Table, Value};

use super::{Config, FileConfig, Format};
use crate::error::{BoxError, CommonsError};
use crate::path::{self, KeyPath, Tree};

/// The TOML [`Format`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Toml;

pub type TomlConfig = FileConfig<Toml>;

impl Format for Toml {
    type Document = Table;

    const NAME: &'static str = "toml";

    fn parse(input: &str) -> Result<Self::Document, BoxError> {
        Ok(input.parse::<Table>()?)
    }

    fn render(document: &Self::Document) -> Result<String, BoxError> {
        Ok(::toml::to_string_pretty(document)?)
    }
}

impl Tree for Table {
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
        value.as_table()
    }

    fn as_tree_mut(value: &mut Value) -> Option<&mut Self> {
        value.as_table_mut()
    }

    fn empty_tree() -> Value {
        Value::Table(Table::new())
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: &Value) -> Option<T> {
    match value.clone().try_into() {
        Ok(v) => Some(v),
        Err(e) => {
            debug!(key, error = %e, "value doesn't decode, using default");
            None
        }
    }
}

impl Config for FileConfig<Toml> {
    fn get(&self, key: &str, default: &str) -> Result<String, CommonsError> {
        KeyPath::parse(key)?;
        let text = match self.document.get(key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Integer(i)) => Some(i.to_string()),
            Some(Value::Float(f)) => Some(f.to_string()),
            Some(Value::Boolean(b)) => Some(b.to_string()),
            Some(Value::Datetime(d)) => Some(d.to_string()),
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

    fn set_value<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), CommonsError> {
        let path = KeyPath::parse(key)?;
        let value = Value::try_from(value).map_err(|e| CommonsError::InvalidValue {
            key: key.into(),
            reason: e.to_string(),
        })?;
        if !path::insert(&mut self.document, &path, value) {
            warn!(key, "path is blocked by a non-table value, write ignored");
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
