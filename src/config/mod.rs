//! File-backed key-value configuration.
//!
//! A config is two capabilities glued onto one in-memory document:
//!
//! - [`Config`]: typed reads and writes by key, plus [`at`](Config::at) for
//!   dotted-path reads through nested objects.
//! - [`Persistent`]: binding an [`IoSource`], loading, saving, auto-save, and
//!   first-run seeding through [`default_in`](Persistent::default_in).
//!
//! [`FileConfig`] implements the lifecycle once for every [`Format`]; each
//! backend only supplies parsing, rendering and key semantics:
//!
//! | Backend | Document | Nested objects |
//! |---------|----------|----------------|
//! | [`JsonConfig`] | `serde_json::Map` | yes |
//! | [`TomlConfig`] | `toml::Table` | yes |
//! | [`PropertiesConfig`] | `IndexMap<String, String>` | no, dots are literal |
//!
//! # Lifecycle
//!
//! ```text
//! new() ──bind()──▶ bound ──load()──▶ loaded ──set()──▶ loaded (+ save() if auto-save)
//! ```
//!
//! `load`, `save` and `default_in` on an unbound config fail with
//! [`CommonsError::NoSource`]. Reads and writes never need a source; they
//! operate on whatever is in memory, and auto-save only kicks in once a source
//! is bound.
//!
//! # Missing vs. incompatible
//!
//! [`Config::at`] separates a path that is structurally absent (`Ok(None)`)
//! from a value that is present but doesn't decode as the requested type
//! (`Ok(Some(default))`). A scalar sitting where an object is expected is an
//! error on read but silently blocks a write.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::{BoxError, CommonsError};
use crate::source::{self, IoSource};

mod json;
mod properties;
#[cfg(feature = "toml")]
mod toml;

pub use json::{Json, JsonConfig};
pub use properties::{Properties, PropertiesConfig, PropertiesError};
#[cfg(feature = "toml")]
pub use self::toml::{Toml, TomlConfig};

/// Typed key-value access.
pub trait Config {
    /// Top-level string lookup. Dots in `key` are not traversed.
    fn get(&self, key: &str, default: &str) -> Result<String, CommonsError>;

    /// Top-level typed lookup; `default` when the key is absent or its value
    /// doesn't decode as `T`.
    fn get_as<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T, CommonsError>
    where
        Self: Sized;

    fn set(&mut self, key: &str, value: &str) -> Result<(), CommonsError>;

    /// Write any serializable value. Backends with object support create the
    /// intermediate objects of a dotted key.
    fn set_value<V: Serialize + ?Sized>(&mut self, key: &str, value: &V) -> Result<(), CommonsError>
    where
        Self: Sized;

    /// Dotted-path read: `Ok(None)` when the path is absent, `Ok(Some(default))`
    /// when the value is present but doesn't decode.
    fn at<T: DeserializeOwned>(&self, path: &str, default: T) -> Result<Option<T>, CommonsError>
    where
        Self: Sized;

    fn objects_supported(&self) -> bool;

    fn saving_supported(&self) -> bool;
}

/// Binding to an [`IoSource`] and the load/save lifecycle.
pub trait Persistent {
    /// Rebind the source. Does not load.
    fn bind<S: IoSource + 'static>(&mut self, source: S) -> &mut Self
    where
        Self: Sized;

    fn source(&self) -> Option<&dyn IoSource>;

    fn set_auto_save(&mut self, auto_save: bool) -> &mut Self
    where
        Self: Sized;

    fn auto_save(&self) -> bool;

    /// Replace the in-memory document with the bound source's content.
    fn load(&mut self) -> Result<(), CommonsError>;

    /// Write the in-memory document to the bound source.
    fn save(&self) -> Result<(), CommonsError>;

    /// First-run seeding: when the bound source doesn't exist yet, load
    /// `fallback` and save it to the bound source. No-op otherwise.
    fn default_in(&mut self, fallback: &dyn IoSource) -> Result<(), CommonsError>;
}

/// A file format: how a document is read from and written to text.
pub trait Format {
    type Document: Default + fmt::Debug + Send;

    /// Short name used in logs.
    const NAME: &'static str;

    fn parse(input: &str) -> Result<Self::Document, BoxError>;

    fn render(document: &Self::Document) -> Result<String, BoxError>;
}

/// A config document of format `F`, optionally bound to an [`IoSource`].
pub struct FileConfig<F: Format> {
    source: Option<Box<dyn IoSource>>,
    auto_save: bool,
    document: F::Document,
}

impl<F: Format> FileConfig<F> {
    /// An empty, unbound config with auto-save enabled.
    pub fn new() -> Self {
        Self {
            source: None,
            auto_save: true,
            document: F::Document::default(),
        }
    }

    /// Bind `source`, loading it if it already exists.
    pub fn open<S: IoSource + 'static>(source: S) -> Result<Self, CommonsError> {
        let mut config = Self::new().with_source(source);
        if config.source.as_deref().is_some_and(|s| s.exists()) {
            config.load()?;
        }
        Ok(config)
    }

    pub fn with_source<S: IoSource + 'static>(mut self, source: S) -> Self {
        self.bind(source);
        self
    }

    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    /// The in-memory document.
    pub fn document(&self) -> &F::Document {
        &self.document
    }

    fn bound_source(&self) -> Result<&dyn IoSource, CommonsError> {
        self.source.as_deref().ok_or(CommonsError::NoSource)
    }

    fn source_is_writable(&self) -> bool {
        self.source.as_deref().is_some_and(|s| s.is_writable())
    }

    /// Persist after a successful mutation when auto-save applies.
    fn after_mutation(&self) -> Result<(), CommonsError> {
        if self.auto_save && self.source.is_some() {
            self.save()
        } else {
            Ok(())
        }
    }
}

impl<F: Format> Default for FileConfig<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Format> fmt::Debug for FileConfig<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileConfig")
            .field("format", &F::NAME)
            .field("source", &self.source)
            .field("auto_save", &self.auto_save)
            .field("document", &self.document)
            .finish()
    }
}

impl<F: Format> Persistent for FileConfig<F> {
    fn bind<S: IoSource + 'static>(&mut self, source: S) -> &mut Self {
        debug!(format = F::NAME, source = %source.id(), "binding config source");
        self.source = Some(Box::new(source));
        self
    }

    fn source(&self) -> Option<&dyn IoSource> {
        self.source.as_deref()
    }

    fn set_auto_save(&mut self, auto_save: bool) -> &mut Self {
        self.auto_save = auto_save;
        self
    }

    fn auto_save(&self) -> bool {
        self.auto_save
    }

    fn load(&mut self) -> Result<(), CommonsError> {
        let source = self.bound_source()?;
        let document = read_document::<F>(source)?;
        debug!(format = F::NAME, source = %source.id(), "loaded config");
        self.document = document;
        Ok(())
    }

    fn save(&self) -> Result<(), CommonsError> {
        let source = self.bound_source()?;
        if !source.is_writable() {
            return Err(CommonsError::ReadOnlySource { id: source.id() });
        }
        let content = F::render(&self.document).map_err(|e| CommonsError::InvalidValue {
            key: "<document>".into(),
            reason: e.to_string(),
        })?;
        source::write_string(source, &content)?;
        debug!(format = F::NAME, source = %source.id(), "saved config");
        Ok(())
    }

    fn default_in(&mut self, fallback: &dyn IoSource) -> Result<(), CommonsError> {
        let source = self.bound_source()?;
        if source.exists() {
            return Ok(());
        }
        if !fallback.exists() {
            return Err(CommonsError::MissingDefault { id: fallback.id() });
        }
        info!(
            format = F::NAME,
            source = %source.id(),
            fallback = %fallback.id(),
            "seeding config from default"
        );
        self.document = read_document::<F>(fallback)?;
        self.save()
    }
}

fn read_document<F: Format>(source: &dyn IoSource) -> Result<F::Document, CommonsError> {
    let content = source::read_to_string(source)?;
    F::parse(&content).map_err(|e| CommonsError::ParseError {
        id: source.id(),
        source: e,
    })
}
