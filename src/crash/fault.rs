use std::any::type_name;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

/// A fault to report: a kind tag, a message, and the captured trace.
///
/// Listeners registered with [`CrashHandler::on`](super::CrashHandler::on)
/// are matched against [`kind`](Self::kind) exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    kind: String,
    message: String,
    trace: String,
}

impl Fault {
    /// A fault of `kind`, with a backtrace of the calling thread when
    /// backtraces are enabled (`RUST_BACKTRACE`).
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        let kind = kind.into();
        let message = message.into();
        let trace = render_trace(&kind, &message, &[]);
        Self {
            kind,
            message,
            trace,
        }
    }

    /// A fault tagged with the error's type name, tracing its `source()` chain.
    pub fn from_error<E: Error + 'static>(error: &E) -> Self {
        let kind = type_name::<E>().to_string();
        let message = error.to_string();
        let mut causes = Vec::new();
        let mut next = error.source();
        while let Some(cause) = next {
            causes.push(cause.to_string());
            next = cause.source();
        }
        let trace = render_trace(&kind, &message, &causes);
        Self {
            kind,
            message,
            trace,
        }
    }

    /// Replace the captured trace.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = trace.into();
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

fn render_trace(kind: &str, message: &str, causes: &[String]) -> String {
    let mut trace = format!("{kind}: {message}");
    for cause in causes {
        trace.push_str("\nCaused by: ");
        trace.push_str(cause);
    }
    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        trace.push_str("\nstack backtrace:\n");
        trace.push_str(&backtrace.to_string());
    }
    trace
}
