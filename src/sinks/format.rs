use std::fmt::Write;

use crate::log::log_event::LogEvent;

/// Timestamp layout at the head of a rendered line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeStyle {
    /// `HH:MM:SS`, used on the console.
    Time,
    /// `YYYY-MM-DD HH:MM:SS`, used in files.
    DateTime,
}

impl TimeStyle {
    fn pattern(self) -> &'static str {
        match self {
            TimeStyle::Time => "%H:%M:%S",
            TimeStyle::DateTime => "%Y-%m-%d %H:%M:%S",
        }
    }
}

/// Appends `"<time> <LEVEL> <file>:<line>: <message>\n"` to `buf`.
///
/// The level is left-aligned in five columns.
pub fn format_line(buf: &mut String, event: &LogEvent<'_>, style: TimeStyle) {
    // Writing into a String cannot fail.
    let _ = writeln!(
        buf,
        "{} {:<5} {}:{}: {}",
        event.timestamp().format(style.pattern()),
        event.level(),
        event.file(),
        event.line(),
        event.message()
    );
}
