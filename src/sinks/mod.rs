//! Built-in sinks.
//!
//! Every sink renders an event into one line with [`format_line`] and writes
//! it with a single call, so a line is never split across writes.

pub mod console_sink;
pub mod file_sink;
pub mod format;
pub mod rotating_file_sink;
pub mod writer_sink;


pub use console_sink::{ConsoleSink, ConsoleStream};
pub use file_sink::FileSink;
pub use format::{TimeStyle, format_line};
pub use rotating_file_sink::RotatingFileSink;
pub use writer_sink::WriterSink;
