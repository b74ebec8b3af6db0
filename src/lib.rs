//! Application commons: file-backed configuration, I/O sources, and crash
//! reports for desktop and service applications.
//!
//! ```ignore
//! use appcommons::{Config, JsonConfig, Persistent, Source};
//!
//! let mut config = JsonConfig::new().with_source(Source::file("config.json"));
//! config.default_in(&Source::at::<Resources>("default.json"))?;
//!
//! config.set_value("window.size.width", &1280)?;   // saved immediately
//! let width: Option<u32> = config.at("window.size.width", 800)?;
//! ```
//!
//! # I/O sources
//!
//! Configs never open files themselves. They read and write through an
//! [`IoSource`]:
//!
//! - [`FileSource`]: a path on disk. Writing creates missing parent
//!   directories.
//! - [`EmbeddedSource`]: a resource compiled into the binary with
//!   [`rust_embed`]. Read-only; writing fails with
//!   [`CommonsError::Unsupported`].
//! - [`Source::at`]: the bundled resource if there is one, otherwise the file
//!   with the same name. Bundled defaults shadow files.
//!
//! # Configs
//!
//! Every backend is a [`FileConfig`] over a [`Format`] and implements two
//! traits:
//!
//! - [`Config`]: `get`, `get_as`, `set`, `set_value`, and `at` for dotted
//!   paths through nested objects.
//! - [`Persistent`]: `bind`, `load`, `save`, auto-save, and `default_in` for
//!   first-run seeding from a fallback source.
//!
//! | Backend | Nested objects | Stored as |
//! |---------|----------------|-----------|
//! | [`JsonConfig`] | yes | pretty-printed JSON, insertion ordered |
//! | [`TomlConfig`] | yes | TOML (feature `toml`, on by default) |
//! | [`PropertiesConfig`] | no | `key=value` lines |
//!
//! ## Paths
//!
//! `set_value("a.b.c", &42)` creates `a` and `a.b` as empty objects when they
//! are missing. If a scalar is in the way (`a` is `1`), the write is ignored
//! and nothing else changes. Reading is stricter:
//!
//! | Situation | `at("a.b.c", default)` |
//! |-----------|------------------------|
//! | `a` or `a.b` missing | `Ok(None)` |
//! | `a` is a scalar | `Err(TypeMismatch)` naming `a` |
//! | `c` present but not decodable | `Ok(Some(default))` |
//! | `c` decodes | `Ok(Some(value))` |
//!
//! `get`/`get_as` read top-level keys only; dots in the key are not
//! traversed.
//!
//! ## Auto-save
//!
//! Auto-save is on by default: once a source is bound, each successful `set`
//! saves before it returns. Turn it off with
//! [`with_auto_save(false)`](FileConfig::with_auto_save) and call
//! [`save`](Persistent::save) yourself.
//!
//! # Crash reports
//!
//! [`CrashHandler`] turns a [`Fault`] into a fixed-layout text report, after
//! giving listeners a chance to cancel it through a [`Canceller`]. Reports are
//! logged through `tracing` and written to `<app folder>/crashes` when the
//! [`App`] has a folder.
//!
//! # Error handling
//!
//! All fallible operations return [`CommonsError`]. A value that fails to
//! decode is not an error: typed reads fall back to the caller's default.

pub mod app;
pub mod cancel;
pub mod config;
pub mod crash;
pub mod error;
pub mod path;
pub mod source;

#[cfg(test)]
mod fixtures;

pub use app::{App, AppInfo};
pub use cancel::Canceller;
#[cfg(feature = "toml")]
pub use config::TomlConfig;
pub use config::{Config, FileConfig, Format, JsonConfig, Persistent, PropertiesConfig};
pub use crash::{CrashHandler, CrashReport, Fault, ReportField};
pub use error::CommonsError;
pub use path::KeyPath;
pub use source::{EmbeddedSource, FileSource, IoSource, Source};
