//! Leveled logging macros for [`Logger`](crate::log::logger::Logger) and
//! [`LoggerHandle`](crate::log::logger_handle::LoggerHandle).
//!
//! Each macro captures `file!()` and `line!()` at the call site and binds its
//! arguments with `format_args!`, so nothing is rendered unless a sink accepts
//! the event.
//!
//! # Feature Flags
//! Levels are compiled in by cargo features: `log-trace`, `log-debug`,
//! `log-info`, `log-warn`, `log-error`, `log-fatal`. Each one implies the
//! levels above it. A disabled level expands to `()`, so its arguments are
//! never evaluated.
//!
//! ```ignore
//! sinklog::logger_warn!(handle, "retrying {} after {:?}", peer, backoff);
//! ```

#[macro_export]
macro_rules! logger_log {
    ($logger:expr, $lvl:expr, $($arg:tt)+) => {{
        $logger.log($lvl, file!(), line!(), format_args!($($arg)+))
    }};
}

// ---------------------- TRACE ----------------------
#[cfg(feature = "log-trace")]
#[macro_export]
macro_rules! logger_trace { ($logger:expr, $($arg:tt)+) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Trace, $($arg)+) } }

#[cfg(not(feature = "log-trace"))]
#[macro_export]
macro_rules! logger_trace {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- DEBUG ----------------------
#[cfg(feature = "log-debug")]
#[macro_export]
macro_rules! logger_debug { ($logger:expr, $($arg:tt)+) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Debug, $($arg)+) } }

#[cfg(not(feature = "log-debug"))]
#[macro_export]
macro_rules! logger_debug {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- INFO ----------------------
#[cfg(feature = "log-info")]
#[macro_export]
macro_rules! logger_info { ($logger:expr, $($arg:tt)+) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Info, $($arg)+) } }

#[cfg(not(feature = "log-info"))]
#[macro_export]
macro_rules! logger_info {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- WARN ----------------------
#[cfg(feature = "log-warn")]
#[macro_export]
macro_rules! logger_warn { ($logger:expr, $($arg:tt)+) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Warn, $($arg)+) } }

#[cfg(not(feature = "log-warn"))]
#[macro_export]
macro_rules! logger_warn {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- ERROR ----------------------
#[cfg(feature = "log-error")]
#[macro_export]
macro_rules! logger_error { ($logger:expr, $($arg:tt)+) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Error, $($arg)+) } }

#[cfg(not(feature = "log-error"))]
#[macro_export]
macro_rules! logger_error {
    ($($arg:tt)*) => {
        ()
    };
}

// ---------------------- FATAL ----------------------
#[cfg(feature = "log-fatal")]
#[macro_export]
macro_rules! logger_fatal { ($logger:expr, $($arg:tt)+) => { $crate::logger_log!($logger, $crate::log::log_level::LogLevel::Fatal, $($arg)+) } }

#[cfg(not(feature = "log-fatal"))]
#[macro_export]
macro_rules! logger_fatal {
    ($($arg:tt)*) => {
        ()
    };
}
