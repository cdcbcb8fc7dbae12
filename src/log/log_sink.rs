use std::io;

use crate::log::{log_event::LogEvent, log_level::LogLevel};
use crate::registry::SinkId;

/// An output destination registered with a [`Logger`](crate::log::logger::Logger).
///
/// The sink owns its target (stream, file, buffer) and knows how to format
/// and write one event to it. Calls are serialized by the logger: at most one
/// `write_event` runs at a time across every thread (and, with a shared lock,
/// every process) using the same provider.
///
/// A sink must never submit to the logger it is registered with; the
/// submission lock is not re-entrant and doing so deadlocks.
pub trait LogSink: Send {
    /// Formats and writes one event.
    ///
    /// An `Err` is reported on the diagnostic channel by the dispatcher and
    /// does not stop delivery to the remaining sinks.
    fn write_event(&mut self, event: &LogEvent<'_>, ctx: &mut SinkContext<'_>) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Generation of the physical file this sink writes, for rotating sinks.
    fn generation(&self) -> Option<u32> {
        None
    }
}

/// Registry change requested by a sink while an event is in flight.
pub(crate) enum RegistryRequest {
    Remove(SinkId),
    Register {
        name: String,
        min_level: LogLevel,
        sink: Box<dyn LogSink>,
    },
}

/// Per-invocation context handed to a sink.
///
/// Carries the identity of the sink being invoked and lets it queue registry
/// changes. Queued changes are applied once the current event has reached
/// every sink, so they only affect later events.
pub struct SinkContext<'r> {
    id: SinkId,
    name: &'r str,
    requests: &'r mut Vec<RegistryRequest>,
}

impl<'r> SinkContext<'r> {
    pub(crate) fn new(id: SinkId, name: &'r str, requests: &'r mut Vec<RegistryRequest>) -> Self {
        Self { id, name, requests }
    }

    #[must_use]
    pub fn id(&self) -> SinkId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.name
    }

    /// Unregisters the invoking sink after the current event.
    pub fn remove_self(&mut self) {
        self.requests.push(RegistryRequest::Remove(self.id));
    }

    /// Unregisters another sink after the current event.
    pub fn remove(&mut self, id: SinkId) {
        self.requests.push(RegistryRequest::Remove(id));
    }

    /// Registers a new sink after the current event. Registration errors are
    /// reported on the diagnostic channel.
    pub fn register(&mut self, name: impl Into<String>, min_level: LogLevel, sink: Box<dyn LogSink>) {
        self.requests.push(RegistryRequest::Register {
            name: name.into(),
            min_level,
            sink,
        });
    }
}

/// A sink backed by a closure. Build one with [`from_fn`].
pub struct FnSink<F> {
    f: F,
}

/// Wraps a closure as a [`LogSink`].
///
/// ```rust
/// use sinklog::log::log_sink::from_fn;
///
/// let sink = from_fn(|ev, ctx| {
///     println!("[{}] {}", ctx.name(), ev.message());
///     Ok(())
/// });
/// # let _ = sink;
/// ```
pub fn from_fn<F>(f: F) -> FnSink<F>
where
    F: FnMut(&LogEvent<'_>, &mut SinkContext<'_>) -> io::Result<()> + Send,
{
    FnSink { f }
}

impl<F> LogSink for FnSink<F>
where
    F: FnMut(&LogEvent<'_>, &mut SinkContext<'_>) -> io::Result<()> + Send,
{
    fn write_event(&mut self, event: &LogEvent<'_>, ctx: &mut SinkContext<'_>) -> io::Result<()> {
        (self.f)(event, ctx)
    }
}
