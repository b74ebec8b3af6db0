//! Application identity: a display name, a version, and an optional folder
//! where the application keeps its files (crash reports land in
//! `<folder>/crashes`).

use std::path::{Path, PathBuf};

use crate::error::CommonsError;

/// What the rest of the crate needs to know about the running application.
pub trait App {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// The application's storage folder, if it has one.
    fn folder(&self) -> Option<&Path> {
        None
    }
}

/// A plain [`App`] descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    name: String,
    version: String,
    folder: Option<PathBuf>,
}

impl AppInfo {
    /// Fails with [`CommonsError::InvalidArgument`] when `name` is empty.
    pub fn new(name: &str, version: &str) -> Result<Self, CommonsError> {
        if name.trim().is_empty() {
            return Err(CommonsError::InvalidArgument(
                "application name is empty".into(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            version: version.to_string(),
            folder: None,
        })
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Use the platform data directory for this app (e.g.
    /// `~/.local/share/{name}` on Linux). Left unset when no home directory
    /// can be found.
    pub fn with_platform_folder(mut self) -> Self {
        self.folder = directories::ProjectDirs::from("", "", &self.name)
            .map(|dirs| dirs.data_dir().to_path_buf());
        self
    }
}

impl App for AppInfo {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }
}
