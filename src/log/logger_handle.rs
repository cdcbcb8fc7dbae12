use std::ops::Deref;
use std::sync::Arc;

use crate::config::LoggerConfig;
use crate::error::Result;
use crate::log::logger::Logger;

/// Lightweight, cloneable handle to a shared [`Logger`].
///
/// Clones point at the same registry and lock; the logger shuts down when the
/// last clone is dropped, or earlier through [`Logger::shutdown`].
///
/// # Examples
/// ```ignore
/// let handle = LoggerHandle::init(&LoggerConfig::new("server"))?;
/// let worker = handle.clone();
/// std::thread::spawn(move || sinklog::logger_info!(worker, "started task"));
/// ```
#[derive(Clone, Debug)]
pub struct LoggerHandle {
    inner: Arc<Logger>,
}

impl LoggerHandle {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            inner: Arc::new(logger),
        }
    }

    /// Shorthand for [`Logger::init`] wrapped in a handle.
    pub fn init(config: &LoggerConfig) -> Result<Self> {
        Logger::init(config).map(Self::new)
    }

    /// Number of live handles to this logger.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.inner
    }
}

impl From<Logger> for LoggerHandle {
    fn from(logger: Logger) -> Self {
        Self::new(logger)
    }
}
