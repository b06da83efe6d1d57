//! Run-time tracing for table construction and parsing.
//!
//! Traces go to stderr, only in debug builds and only when the `LRK_LOG`
//! environment variable is set.

use std::fmt;

#[doc(hidden)]
pub fn log_enabled() -> bool {
    std::env::var("LRK_LOG").is_ok()
}

#[doc(hidden)]
pub fn trace(args: fmt::Arguments<'_>) {
    if log_enabled() {
        eprintln!("{args}");
    }
}

#[doc(hidden)]
pub fn tracen(args: fmt::Arguments<'_>) {
    if log_enabled() {
        eprint!("{args}");
    }
}

/// Prints a trace line. Compiled to nothing in release builds.
#[macro_export]
macro_rules! log {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::debug::trace(::std::format_args!($($arg)*));
        }
    };
}

/// Same as [`log!`] but without the trailing newline, so a result tag can
/// finish the line.
#[macro_export]
macro_rules! logn {
    ($($arg:tt)*) => {
        if cfg!(debug_assertions) {
            $crate::debug::tracen(::std::format_args!($($arg)*));
        }
    };
}
