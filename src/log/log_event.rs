use std::cell::OnceCell;
use std::fmt;

use chrono::{DateTime, Local};

use crate::log::log_level::LogLevel;

/// Represents a single log submission.
///
/// An event is built once per call to [`Logger::submit`](crate::log::logger::Logger::submit)
/// and handed by reference to every sink that passes the level filter. The
/// timestamp is resolved when the event is built, and the message is rendered
/// from its bound arguments at most once, the first time a sink asks for it.
pub struct LogEvent<'a> {
    /// The severity level of the event.
    level: LogLevel,
    /// Source file of the call site, typically `file!()`.
    file: &'a str,
    /// Source line of the call site, typically `line!()`.
    line: u32,
    /// Wall-clock time of the submission, shared by all sinks.
    timestamp: DateTime<Local>,
    args: fmt::Arguments<'a>,
    message: OnceCell<String>,
}

impl<'a> LogEvent<'a> {
    /// Creates an event stamped with the current local time.
    ///
    /// # Example
    ///
    /// ```rust
    /// use sinklog::log::{LogEvent, LogLevel};
    ///
    /// let peer = "10.0.0.7";
    /// let text = LogEvent::new(LogLevel::Info, file!(), line!(), format_args!("connected to {peer}"))
    ///     .message()
    ///     .to_owned();
    /// assert_eq!(text, "connected to 10.0.0.7");
    /// ```
    pub fn new(level: LogLevel, file: &'a str, line: u32, args: fmt::Arguments<'a>) -> Self {
        Self::with_timestamp(level, file, line, Local::now(), args)
    }

    pub fn with_timestamp(
        level: LogLevel,
        file: &'a str,
        line: u32,
        timestamp: DateTime<Local>,
        args: fmt::Arguments<'a>,
    ) -> Self {
        Self {
            level,
            file,
            line,
            timestamp,
            args,
            message: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        self.level
    }

    #[must_use]
    pub fn file(&self) -> &'a str {
        self.file
    }

    #[must_use]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[must_use]
    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    /// The bound format arguments, for sinks that stream them directly.
    #[must_use]
    pub fn args(&self) -> fmt::Arguments<'a> {
        self.args
    }

    /// The rendered message text. Formatting happens on the first call only.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.get_or_init(|| match self.args.as_str() {
            Some(s) => s.to_owned(),
            None => self.args.to_string(),
        })
    }
}

impl fmt::Debug for LogEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogEvent")
            .field("level", &self.level)
            .field("file", &self.file)
            .field("line", &self.line)
            .field("timestamp", &self.timestamp)
            .field("message", &self.message())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::cell::Cell;

    struct CountingDisplay<'c>(&'c Cell<u32>);

    impl fmt::Display for CountingDisplay<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.set(self.0.get() + 1);
            f.write_str("rendered")
        }
    }

    fn with_event(level: LogLevel, args: fmt::Arguments<'_>, check: impl FnOnce(&LogEvent<'_>)) {
        let ev = LogEvent::new(level, "src/net.rs", 42, args);
        check(&ev);
    }

    #[test]
    fn message_is_rendered_once() {
        let calls = Cell::new(0);
        let arg = CountingDisplay(&calls);
        with_event(LogLevel::Debug, format_args!("value={}", arg), |ev| {
            assert_eq!(calls.get(), 0, "rendering must be lazy");
            assert_eq!(ev.message(), "value=rendered");
            assert_eq!(ev.message(), "value=rendered");
        });
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn carries_call_site() {
        with_event(LogLevel::Warn, format_args!("plain"), |ev| {
            assert_eq!(ev.level(), LogLevel::Warn);
            assert_eq!(ev.file(), "src/net.rs");
            assert_eq!(ev.line(), 42);
            assert_eq!(ev.message(), "plain");
        });
    }
}
