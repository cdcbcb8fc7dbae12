use std::io::{self, Write};

use crate::log::{
    log_event::LogEvent,
    log_sink::{LogSink, SinkContext},
};
use crate::sinks::format::{TimeStyle, format_line};

/// Writes rendered lines to any [`Write`] target.
///
/// Useful for pipes, sockets handed in by the caller, or in-memory buffers.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
    style: TimeStyle,
    buf: String,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W, style: TimeStyle) -> Self {
        Self {
            writer,
            style,
            buf: String::new(),
        }
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn write_event(&mut self, event: &LogEvent<'_>, _ctx: &mut SinkContext<'_>) -> io::Result<()> {
        self.buf.clear();
        format_line(&mut self.buf, event, self.style);
        self.writer.write_all(self.buf.as_bytes())?;
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
