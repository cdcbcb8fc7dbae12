//! Event model, sink abstraction, dispatch and the logger itself.

pub mod dispatch;
pub mod log_event;
pub mod log_level;
pub mod log_macros;
pub mod log_sink;
pub mod logger;
pub mod logger_handle;
pub mod noop_log_sink;

pub use dispatch::DispatchReport;
pub use log_event::LogEvent;
pub use log_level::LogLevel;
pub use log_sink::{FnSink, LogSink, SinkContext, from_fn};
pub use logger::{CONSOLE_SINK_NAME, FILE_SINK_NAME, Logger};
pub use logger_handle::LoggerHandle;
pub use noop_log_sink::NoopLogSink;
