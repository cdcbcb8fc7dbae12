use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Defines the severity levels for log messages.
///
/// Levels are totally ordered: `Trace < Debug < Info < Warn < Error < Fatal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LogLevel {
    /// Designates very fine-grained informational events.
    Trace = 0,
    /// Designates fine-grained informational events that are most useful to debug an application.
    Debug = 1,
    /// Designates informational messages that highlight the progress of the application at coarse-grained level.
    Info = 2,
    /// Designates potentially harmful situations.
    Warn = 3,
    /// Designates error events that might still allow the application to continue running.
    Error = 4,
    /// Designates errors after which the application is not expected to continue.
    Fatal = 5,
}

impl LogLevel {
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// Upper-case name as it appears in rendered lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = ConfigError;

    fn try_from(value: u8) -> Result<Self, ConfigError> {
        LogLevel::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| ConfigError::InvalidLevel(value.to_string()))
    }
}

/// Accepts a level name (any case) or its ordinal `0..=5`.
impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<u8>() {
            return LogLevel::try_from(n);
        }
        LogLevel::ALL
            .into_iter()
            .find(|lvl| lvl.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::InvalidLevel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn levels_are_ordered() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Error < LogLevel::Fatal);
        assert_eq!(LogLevel::ALL.iter().max(), Some(&LogLevel::Fatal));
    }

    #[test]
    fn parses_names_and_ordinals() {
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!(" FATAL ".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert_eq!("1".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert!(matches!(
            "6".parse::<LogLevel>(),
            Err(ConfigError::InvalidLevel(_))
        ));
        assert!(matches!(
            "verbose".parse::<LogLevel>(),
            Err(ConfigError::InvalidLevel(_))
        ));
    }

    #[test]
    fn converts_from_ordinals() {
        assert_eq!(LogLevel::try_from(0u8).unwrap(), LogLevel::Trace);
        assert_eq!(LogLevel::try_from(4u8).unwrap(), LogLevel::Error);
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::try_from(level.as_u8()).unwrap(), level);
        }
        assert!(matches!(
            LogLevel::try_from(6u8),
            Err(ConfigError::InvalidLevel(v)) if v == "6"
        ));
    }

    #[test]
    fn display_honours_padding() {
        assert_eq!(format!("{:<5}|", LogLevel::Info), "INFO |");
        assert_eq!(format!("{}", LogLevel::Error), "ERROR");
    }
}
