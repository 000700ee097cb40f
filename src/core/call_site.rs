//! Call-site metadata attached to every emitted entry

use super::error_trace::base_name;
use super::log_context::FieldRecorder;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::Location;
use std::path::Path;
use std::sync::OnceLock;

/// Frames inspected when looking for the caller's function name
const MAX_CALLER_SEARCH: usize = 64;

/// Symbol prefixes of the frames between a log call and its caller
const LOGGER_FRAMES: &[&str] = &[
    "telemetry_log::core::call_site::CallSite::",
    "telemetry_log::core::call_site::caller_function",
    "telemetry_log::core::logger::Logger::",
    "<telemetry_log::core::call_site::CallSite>::",
    "<telemetry_log::core::logger::Logger>::",
];

/// Field names written for every entry
pub const FILE_KEY: &str = "file";
pub const LINE_KEY: &str = "line";
pub const FUNC_KEY: &str = "func";

type SiteKey = (&'static str, u32, u32);

/// Caller names already resolved, per source location
fn resolved_sites() -> &'static RwLock<HashMap<SiteKey, String>> {
    static SITES: OnceLock<RwLock<HashMap<SiteKey, String>>> = OnceLock::new();
    SITES.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Where a log call was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Base file name of the calling source file
    pub file: String,
    pub line: u32,
    /// Function containing the call, empty when it could not be resolved
    pub func: String,
}

impl CallSite {
    /// Call site known at compile time, as recorded by the logging macros
    pub fn new(file: &str, line: u32, func: &str) -> Self {
        Self {
            file: base_name(Path::new(file)),
            line,
            func: func.to_string(),
        }
    }

    /// Call site of a `#[track_caller]` location reached through a
    /// [`Logger`](crate::Logger) method.
    ///
    /// File and line come from the location. The function name is the symbol
    /// of the first stack frame outside the logger, so it is available
    /// without debug info; it is resolved once per location and cached.
    pub fn from_location(location: &'static Location<'static>) -> Self {
        let key = (location.file(), location.line(), location.column());
        let cached = resolved_sites().read().get(&key).cloned();
        let func = match cached {
            Some(func) => func,
            None => {
                let func = caller_function();
                resolved_sites().write().insert(key, func.clone());
                func
            }
        };

        Self {
            file: base_name(Path::new(location.file())),
            line: location.line(),
            func,
        }
    }

    pub(crate) fn record(&self, recorder: &mut dyn FieldRecorder) {
        recorder.string(FILE_KEY, &self.file);
        recorder.u64(LINE_KEY, self.line as u64);
        recorder.string(FUNC_KEY, &self.func);
    }
}

fn is_logger_frame(name: &str) -> bool {
    LOGGER_FRAMES.iter().any(|prefix| name.starts_with(prefix))
}

/// Symbol name of the first frame above this one that is not part of the
/// logger. Inlined frames are reported innermost first when debug info is
/// present; without it only the enclosing symbol is seen.
#[inline(never)]
fn caller_function() -> String {
    let anchor = caller_function as *const () as usize;
    let mut anchored = false;
    let mut found: Option<String> = None;
    let mut unresolved = false;
    let mut depth = 0;

    backtrace::trace(|frame| {
        if !anchored {
            anchored = frame.symbol_address() as usize == anchor;
            return true;
        }

        depth += 1;
        let mut named = false;
        backtrace::resolve_frame(frame, |symbol| {
            if found.is_some() {
                return;
            }
            if let Some(name) = symbol.name() {
                named = true;
                let name = format!("{:#}", name);
                if !is_logger_frame(&name) {
                    found = Some(name);
                }
            }
        });
        if !named {
            unresolved = true;
        }

        found.is_none() && !unresolved && depth < MAX_CALLER_SEARCH
    });

    found.unwrap_or_default()
}

/// Name of the enclosing function, resolved at compile time.
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn __f() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__f);
        name.strip_suffix("::__f").unwrap_or(name)
    }};
}
