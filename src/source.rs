//! Byte-level endpoints for configs: host files and bundled resources.
//!
//! An [`IoSource`] answers three questions: can I read from you, can I write
//! to you, and do you exist? Configs only ever talk to sources, so the same
//! backend works against a file on disk, a resource compiled into the binary,
//! or whatever a test injects.
//!
//! Bundled resources come from [`rust_embed`]: the application derives
//! `Embed` on a marker type and passes it as the bundle parameter.
//!
//! ```ignore
//! #[derive(rust_embed::Embed)]
//! #[folder = "resources"]
//! struct Resources;
//!
//! // `default.json` from the bundle if present, `./default.json` otherwise.
//! let defaults = Source::at::<Resources>("default.json");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use rust_embed::Embed;

use crate::error::CommonsError;

/// Something bytes can be read from and, possibly, written to.
///
/// Every call to `provide_input`/`provide_output` returns a fresh stream; the
/// caller owns it and drops it when done.
pub trait IoSource: fmt::Debug + Send + Sync {
    /// Identity used in errors and logs.
    fn id(&self) -> String;

    /// Open a fresh reader. Fails with [`CommonsError::IoError`] when the
    /// source doesn't exist or can't be opened.
    fn provide_input(&self) -> Result<Box<dyn Read>, CommonsError>;

    /// Open a fresh writer that truncates the target.
    fn provide_output(&self) -> Result<Box<dyn Write>, CommonsError>;

    fn exists(&self) -> bool;

    /// Whether `provide_output` can succeed at all.
    fn is_writable(&self) -> bool {
        true
    }
}

impl<S: IoSource + ?Sized> IoSource for Box<S> {
    fn id(&self) -> String {
        (**self).id()
    }

    fn provide_input(&self) -> Result<Box<dyn Read>, CommonsError> {
        (**self).provide_input()
    }

    fn provide_output(&self) -> Result<Box<dyn Write>, CommonsError> {
        (**self).provide_output()
    }

    fn exists(&self) -> bool {
        (**self).exists()
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }
}

/// A file on the host filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> CommonsError {
        CommonsError::IoError {
            id: self.id(),
            source,
        }
    }
}

impl IoSource for FileSource {
    fn id(&self) -> String {
        self.path.display().to_string()
    }

    fn provide_input(&self) -> Result<Box<dyn Read>, CommonsError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        Ok(Box::new(file))
    }

    fn provide_output(&self) -> Result<Box<dyn Write>, CommonsError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| CommonsError::IoError {
                id: parent.display().to_string(),
                source: e,
            })?;
        }
        let file = File::create(&self.path).map_err(|e| self.io_error(e))?;
        Ok(Box::new(file))
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

type Lookup = fn(&str) -> Option<Cow<'static, [u8]>>;

fn lookup_in<E: Embed>(path: &str) -> Option<Cow<'static, [u8]>> {
    E::get(path).map(|file| file.data)
}

/// A read-only resource bundled into the binary.
#[derive(Clone)]
pub struct EmbeddedSource {
    path: String,
    lookup: Lookup,
}

impl EmbeddedSource {
    /// Address `path` inside bundle `E`. A leading `/` is ignored.
    pub fn new<E: Embed>(path: &str) -> Self {
        Self {
            path: path.trim_start_matches('/').to_string(),
            lookup: lookup_in::<E>,
        }
    }

    /// Path inside the bundle, without the leading `/`.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Debug for EmbeddedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedSource")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl IoSource for EmbeddedSource {
    fn id(&self) -> String {
        format!("embedded:/{}", self.path)
    }

    fn provide_input(&self) -> Result<Box<dyn Read>, CommonsError> {
        let data = (self.lookup)(&self.path).ok_or_else(|| CommonsError::IoError {
            id: self.id(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such embedded resource"),
        })?;
        Ok(Box::new(Cursor::new(data)))
    }

    fn provide_output(&self) -> Result<Box<dyn Write>, CommonsError> {
        Err(CommonsError::Unsupported(format!(
            "cannot write to embedded source {}",
            self.id()
        )))
    }

    fn exists(&self) -> bool {
        (self.lookup)(&self.path).is_some()
    }

    fn is_writable(&self) -> bool {
        false
    }
}

/// Either kind of built-in source, as returned by [`Source::at`].
#[derive(Debug, Clone)]
pub enum Source {
    File(FileSource),
    Embedded(EmbeddedSource),
}

impl Source {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Source::File(FileSource::new(path))
    }

    pub fn embedded<E: Embed>(path: &str) -> Self {
        Source::Embedded(EmbeddedSource::new::<E>(path))
    }

    /// Resolve `path` against bundle `E` first, then the filesystem.
    ///
    /// Bundled resources shadow files of the same name.
    pub fn at<E: Embed>(path: &str) -> Self {
        let embedded = EmbeddedSource::new::<E>(path);
        if embedded.exists() {
            Source::Embedded(embedded)
        } else {
            Source::file(path)
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Source::Embedded(_))
    }

    fn inner(&self) -> &dyn IoSource {
        match self {
            Source::File(s) => s,
            Source::Embedded(s) => s,
        }
    }
}

impl From<FileSource> for Source {
    fn from(source: FileSource) -> Self {
        Source::File(source)
    }
}

impl From<EmbeddedSource> for Source {
    fn from(source: EmbeddedSource) -> Self {
        Source::Embedded(source)
    }
}

impl IoSource for Source {
    fn id(&self) -> String {
        self.inner().id()
    }

    fn provide_input(&self) -> Result<Box<dyn Read>, CommonsError> {
        self.inner().provide_input()
    }

    fn provide_output(&self) -> Result<Box<dyn Write>, CommonsError> {
        self.inner().provide_output()
    }

    fn exists(&self) -> bool {
        self.inner().exists()
    }

    fn is_writable(&self) -> bool {
        self.inner().is_writable()
    }
}

/// Read a whole source as UTF-8 text.
pub(crate) fn read_to_string(source: &dyn IoSource) -> Result<String, CommonsError> {
    let mut input = source.provide_input()?;
    let mut content = String::new();
    input
        .read_to_string(&mut content)
        .map_err(|e| CommonsError::IoError {
            id: source.id(),
            source: e,
        })?;
    Ok(content)
}

/// Replace the whole content of a source.
pub(crate) fn write_string(source: &dyn IoSource, content: &str) -> Result<(), CommonsError> {
    let mut output = source.provide_output()?;
    output
        .write_all(content.as_bytes())
        .and_then(|()| output.flush())
        .map_err(|e| CommonsError::IoError {
            id: source.id(),
            source: e,
        })
}
