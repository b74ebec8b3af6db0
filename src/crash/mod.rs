//! Crash reports: turn a [`Fault`] into a fixed-layout text report.
//!
//! A [`CrashHandler`] owns the report fields and two sets of listeners.
//! Handling a fault runs every generic listener, then every listener
//! registered for the fault's exact kind, all sharing one [`Canceller`]. If
//! none of them cancels, the report is logged and, when a crash directory is
//! configured, written to `<dir>/crash-<millis since epoch>`.
//!
//! ```text
//!
//! ###########################################
//!
//! Launcher v1.2.0 crash report
//!
//! Version   : 1.2.0
//! Time      : 2026-10-19T08:15:02Z
//! Exception : [io] disk full
//!
//! ======>
//!
//! io: disk full
//!
//! ###########################################
//!
//! ```
//!
//! Keys are padded to the longest key (at least 9 characters) so the colons
//! line up.

use std::any::type_name;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use tracing::{error, info, warn};

use crate::app::App;
use crate::cancel::Canceller;
use crate::error::CommonsError;

mod fault;
mod field;

pub use fault::Fault;
pub use field::{ConstantField, FnField, ReportField};

const RULE: &str = "###########################################";

const MIN_KEY_WIDTH: usize = 9;

/// Called with the fault being handled; may cancel the report.
pub type Listener = Box<dyn FnMut(&Fault, &mut Canceller)>;

/// A report that was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashReport {
    pub text: String,
    /// Where the report was written, if a crash directory is configured.
    pub path: Option<PathBuf>,
}

pub struct CrashHandler<A: App> {
    app: A,
    crash_dir: Option<PathBuf>,
    fields: Vec<Box<dyn ReportField>>,
    listeners: Vec<Listener>,
    kind_listeners: IndexMap<String, Vec<Listener>>,
}

impl<A: App> CrashHandler<A> {
    /// A handler with the `Version`, `Time` and `Exception` fields, writing to
    /// `<app folder>/crashes` when the app has a folder.
    pub fn new(app: A) -> Self {
        let crash_dir = app.folder().map(|folder| folder.join("crashes"));
        let version = app.version().to_string();
        Self {
            app,
            crash_dir,
            fields: Vec::new(),
            listeners: Vec::new(),
            kind_listeners: IndexMap::new(),
        }
        .field(ConstantField::new("Version", version))
        .field(FnField::new("Time", |_: &dyn App, _: &Fault| {
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        }))
        .field(FnField::new("Exception", |_: &dyn App, fault: &Fault| {
            fault.to_string()
        }))
    }

    pub fn with_crash_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.crash_dir = Some(dir.into());
        self
    }

    /// Only log reports, never write them.
    pub fn without_crash_dir(mut self) -> Self {
        self.crash_dir = None;
        self
    }

    /// Append a report field. Fields print in the order they were added.
    pub fn field(mut self, field: impl ReportField + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    /// Add a listener called for every fault.
    pub fn listener(mut self, listener: impl FnMut(&Fault, &mut Canceller) + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Add a listener called only for faults whose kind is exactly `kind`.
    pub fn on(
        mut self,
        kind: impl Into<String>,
        listener: impl FnMut(&Fault, &mut Canceller) + 'static,
    ) -> Self {
        self.kind_listeners
            .entry(kind.into())
            .or_default()
            .push(Box::new(listener));
        self
    }

    /// Add a listener for faults built by [`Fault::from_error`] from an `E`.
    pub fn on_error<E: Error + 'static>(
        self,
        listener: impl FnMut(&Fault, &mut Canceller) + 'static,
    ) -> Self {
        self.on(type_name::<E>(), listener)
    }

    pub fn app(&self) -> &A {
        &self.app
    }

    pub fn crash_dir(&self) -> Option<&Path> {
        self.crash_dir.as_deref()
    }

    pub fn field_keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.key())
    }

    /// Run the listeners, then build, log and possibly write the report.
    ///
    /// Returns `Ok(None)` when a listener cancelled the report.
    pub fn handle(&mut self, fault: &Fault) -> Result<Option<CrashReport>, CommonsError> {
        let listeners = &mut self.listeners;
        let kind_listeners = &mut self.kind_listeners;
        let cancelled = Canceller::chain(|canceller| {
            for listener in listeners.iter_mut() {
                listener(fault, canceller);
            }
            if let Some(specific) = kind_listeners.get_mut(fault.kind()) {
                for listener in specific.iter_mut() {
                    listener(fault, canceller);
                }
            }
        });
        if cancelled {
            info!(kind = fault.kind(), "crash report cancelled by a listener");
            return Ok(None);
        }

        let text = self.make_report(fault);
        error!("fault caught\n{text}");

        let path = match &self.crash_dir {
            Some(dir) => Some(write_report(dir, &text)?),
            None => None,
        };
        Ok(Some(CrashReport { text, path }))
    }

    /// Run `f`, handling its error and returning `default` if it fails.
    pub fn guard<T, E>(&mut self, f: impl FnOnce() -> Result<T, E>, default: T) -> T
    where
        E: Error + 'static,
    {
        self.run(f).unwrap_or(default)
    }

    /// Run `f`, handling its error and returning `None` if it fails.
    pub fn run<T, E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> Option<T>
    where
        E: Error + 'static,
    {
        match f() {
            Ok(value) => Some(value),
            Err(err) => {
                if let Err(e) = self.handle(&Fault::from_error(&err)) {
                    warn!(error = %e, "failed to write crash report");
                }
                None
            }
        }
    }

    /// Build the report text for `fault`.
    pub fn make_report(&self, fault: &Fault) -> String {
        let width = self
            .fields
            .iter()
            .map(|f| f.key().chars().count())
            .max()
            .unwrap_or(0)
            .max(MIN_KEY_WIDTH);

        let mut out = format!("\n{RULE}\n\n");
        out.push_str(&format!(
            "{} v{} crash report\n\n",
            self.app.name(),
            self.app.version()
        ));
        for field in &self.fields {
            out.push_str(&format!(
                "{:<width$} : {}\n",
                field.key(),
                field.value(&self.app, fault)
            ));
        }
        out.push_str("\n======>\n\n");
        out.push_str(fault.trace());
        out.push_str(&format!("\n\n{RULE}\n\n"));
        out
    }
}

fn write_report(dir: &Path, text: &str) -> Result<PathBuf, CommonsError> {
    fs::create_dir_all(dir).map_err(|e| CommonsError::IoError {
        id: dir.display().to_string(),
        source: e,
    })?;
    let path = dir.join(format!("crash-{}", Utc::now().timestamp_millis()));
    fs::write(&path, text).map_err(|e| CommonsError::IoError {
        id: path.display().to_string(),
        source: e,
    })?;
    info!(path = %path.display(), "crash report saved");
    Ok(path)
}
