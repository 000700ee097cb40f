//! Error stack tracing
//!
//! [`ErrorTrace`] records raw instruction pointers when an error is wrapped
//! and only symbolizes them when the trace is printed. Capture is cheap
//! enough to sit on every failing path; resolution happens once, on the
//! first [`ErrorTrace::print`], and is cached.

use super::field_value::{FieldValue, Loggable};
use serde::{Deserialize, Serialize};
use std::ffi::c_void;
use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

/// Maximum number of frames kept per trace
pub const MAX_TRACE_DEPTH: usize = 32;

/// One resolved stack entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Demangled function name, empty when the symbol is unavailable
    pub name: String,
    /// Base file name (no directories), empty when unknown
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl fmt::Display for TraceFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} ({}:{})", self.name, self.file, line),
            None => write!(f, "{} ({})", self.name, self.file),
        }
    }
}

/// Stack snapshot taken where an error was wrapped.
///
/// # Example
///
/// ```
/// use telemetry_log::ErrorTrace;
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// let trace = ErrorTrace::wrap(&err);
///
/// assert_eq!(trace.to_string(), "disk on fire");
/// assert_eq!(trace.print(), trace.print());
/// ```
#[derive(Clone)]
pub struct ErrorTrace {
    message: Option<String>,
    ips: Vec<usize>,
    resolved: OnceLock<Vec<TraceFrame>>,
}

impl ErrorTrace {
    /// Capture the stack of the caller without an associated error
    #[inline(never)]
    pub fn capture() -> Self {
        Self::capture_skipping(None, 1)
    }

    /// Capture the stack of the caller and keep `err`'s message
    #[inline(never)]
    pub fn wrap(err: &(dyn std::error::Error + '_)) -> Self {
        Self::capture_skipping(Some(err.to_string()), 1)
    }

    /// Walk the stack, dropping every frame up to and including this function
    /// plus `skip` more wrapping frames.
    #[inline(never)]
    pub(crate) fn capture_skipping(message: Option<String>, skip: usize) -> Self {
        let anchor = Self::capture_skipping as *const () as usize;
        let mut ips = Vec::with_capacity(MAX_TRACE_DEPTH + skip);
        let mut anchored = false;

        backtrace::trace(|frame| {
            ips.push(frame.ip() as usize);
            if !anchored && frame.symbol_address() as usize == anchor {
                ips.clear();
                anchored = true;
            }
            !anchored || ips.len() < MAX_TRACE_DEPTH + skip
        });

        // Without an anchor the tracer's own frames stay in; keep them rather than guess.
        let skip = if anchored { skip } else { 0 };
        let ips = ips.into_iter().skip(skip).take(MAX_TRACE_DEPTH).collect();

        Self {
            message,
            ips,
            resolved: OnceLock::new(),
        }
    }

    /// Message of the wrapped error, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Number of captured frames
    pub fn depth(&self) -> usize {
        self.ips.len()
    }

    /// Resolved frames, innermost first
    pub fn frames(&self) -> &[TraceFrame] {
        self.resolved
            .get_or_init(|| self.ips.iter().map(|&ip| resolve_ip(ip)).collect())
    }

    /// Resolved frames as an owned list, innermost first
    pub fn print(&self) -> Vec<TraceFrame> {
        self.frames().to_vec()
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self.frames()).unwrap_or(serde_json::Value::Null)
    }
}

fn resolve_ip(ip: usize) -> TraceFrame {
    let mut frame = TraceFrame::default();
    let mut first = true;

    backtrace::resolve(ip as *mut c_void, |symbol| {
        // Inlined callees are reported first; keep the innermost one.
        if !first {
            return;
        }
        first = false;

        if let Some(name) = symbol.name() {
            frame.name = format!("{:#}", name);
        }
        if let Some(path) = symbol.filename() {
            frame.file = base_name(path);
        }
        frame.line = symbol.lineno();
    });

    frame
}

pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Loggable for ErrorTrace {
    fn as_log(&self) -> FieldValue {
        FieldValue::Any(self.to_json_value())
    }
}

impl fmt::Display for ErrorTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => f.write_str(message),
            None => f.write_str("error trace"),
        }
    }
}

impl fmt::Debug for ErrorTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorTrace")
            .field("message", &self.message)
            .field("depth", &self.ips.len())
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}

impl std::error::Error for ErrorTrace {}
