use std::io;

use crate::log::{
    log_event::LogEvent,
    log_sink::{LogSink, SinkContext},
};

/// Sink that accepts every event and writes nothing.
#[derive(Debug, Clone, Default)]
pub struct NoopLogSink;

impl LogSink for NoopLogSink {
    #[inline]
    fn write_event(&mut self, _event: &LogEvent<'_>, _ctx: &mut SinkContext<'_>) -> io::Result<()> {
        Ok(())
    }
}
