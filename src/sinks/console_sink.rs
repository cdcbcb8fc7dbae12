use std::io::{self, Write};

use crate::log::{
    log_event::LogEvent,
    log_sink::{LogSink, SinkContext},
};
use crate::sinks::format::{TimeStyle, format_line};

/// Which standard stream a [`ConsoleSink`] writes to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConsoleStream {
    #[default]
    Stderr,
    Stdout,
}

/// Writes short-timestamp lines to stderr or stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    stream: ConsoleStream,
    buf: String,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(stream: ConsoleStream) -> Self {
        Self {
            stream,
            buf: String::new(),
        }
    }

    #[must_use]
    pub fn stderr() -> Self {
        Self::new(ConsoleStream::Stderr)
    }

    #[must_use]
    pub fn stdout() -> Self {
        Self::new(ConsoleStream::Stdout)
    }

    #[must_use]
    pub fn stream(&self) -> ConsoleStream {
        self.stream
    }
}

impl LogSink for ConsoleSink {
    fn write_event(&mut self, event: &LogEvent<'_>, _ctx: &mut SinkContext<'_>) -> io::Result<()> {
        self.buf.clear();
        format_line(&mut self.buf, event, TimeStyle::Time);
        match self.stream {
            ConsoleStream::Stderr => {
                let mut out = io::stderr().lock();
                out.write_all(self.buf.as_bytes())?;
                out.flush()
            }
            ConsoleStream::Stdout => {
                let mut out = io::stdout().lock();
                out.write_all(self.buf.as_bytes())?;
                out.flush()
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.stream {
            ConsoleStream::Stderr => io::stderr().flush(),
            ConsoleStream::Stdout => io::stdout().flush(),
        }
    }
}
