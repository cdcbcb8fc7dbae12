use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::{LockKind, LoggerConfig};
use crate::error::{LoggerError, Result};
use crate::log::{
    dispatch::{DispatchReport, dispatch},
    log_event::LogEvent,
    log_level::LogLevel,
    log_sink::LogSink,
};
use crate::registry::{SinkId, SinkInfo, SinkRegistry};
use crate::rotation::RotationPolicy;
use crate::sinks::{ConsoleSink, RotatingFileSink};
use crate::sync::{LocalLock, SyncGuard, SyncProvider};

/// Name of the console sink installed by [`Logger::init`].
pub const CONSOLE_SINK_NAME: &str = "stderr";

/// Name of the rotating file sink installed by [`Logger::init`].
pub const FILE_SINK_NAME: &str = "file";

struct LoggerState {
    registry: SinkRegistry,
    policy: Option<RotationPolicy>,
}

/// Serialized, synchronous multi-sink logger.
///
/// Every submission runs on the caller's thread: the event is built, the
/// synchronization provider is acquired, the event is handed to each sink
/// whose threshold it passes, and the provider is released. Lines from
/// different threads (or processes, with a shared lock) never interleave.
///
/// # Architecture
///
/// 1. **Gate**: events below the logger level are dropped before locking.
/// 2. **Provider**: a [`SyncProvider`] defines who is serialized with whom.
/// 3. **Registry**: sinks in registration order, owned by this logger.
/// 4. **Dispatch**: filter and invoke, isolating failing sinks.
///
/// Sinks must not submit to the logger that invokes them.
pub struct Logger {
    sync: Box<dyn SyncProvider>,
    state: Mutex<LoggerState>,
    level: AtomicU8,
    shut_down: AtomicBool,
}

impl Logger {
    /// Creates a logger with no sinks.
    #[must_use]
    pub fn new(sync: Box<dyn SyncProvider>, capacity: usize, level: LogLevel) -> Self {
        Self {
            sync,
            state: Mutex::new(LoggerState {
                registry: SinkRegistry::with_capacity(capacity),
                policy: None,
            }),
            level: AtomicU8::new(level.as_u8()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Creates a logger with no sinks serialized by a [`LocalLock`].
    #[must_use]
    pub fn local(capacity: usize, level: LogLevel) -> Self {
        Self::new(Box::new(LocalLock::new()), capacity, level)
    }

    /// Validates `config`, builds its lock and installs the default sinks.
    ///
    /// The `"stderr"` console sink comes first unless `quiet` is set, then the
    /// `"file"` rotating sink on `<output_directory>/<base_name>.log`. Both
    /// use the configured level.
    ///
    /// # Errors
    ///
    /// - [`LoggerError::Config`] when an option is out of range.
    /// - [`LoggerError::Sync`] when the shared lock cannot be opened.
    /// - [`LoggerError::Open`] when the live log file cannot be opened.
    ///
    /// Nothing acquired before the failure stays alive.
    pub fn init(config: &LoggerConfig) -> Result<Self> {
        let policy = config.validate()?;

        let sync: Box<dyn SyncProvider> = match &config.lock {
            LockKind::Local => Box::new(LocalLock::new()),
            #[cfg(unix)]
            LockKind::Shared { key } => Box::new(crate::sync::SharedMemoryLock::open(key)?),
            #[cfg(not(unix))]
            LockKind::Shared { .. } => return Err(crate::error::SyncError::Unsupported.into()),
        };
        // Other processes may rotate the files under a shared lock.
        let follow_external = matches!(config.lock, LockKind::Shared { .. });
        let logger = Self::new(sync, config.capacity, config.level);

        let file = RotatingFileSink::open(policy.clone())
            .map_err(|source| LoggerError::Open {
                path: policy.live_path(),
                source,
            })?
            .follow_external_rotation(follow_external);

        if !config.quiet {
            logger.register_sink(CONSOLE_SINK_NAME, config.level, Box::new(ConsoleSink::stderr()))?;
        }
        logger.register_sink(FILE_SINK_NAME, config.level, Box::new(file))?;

        debug!(
            path = %policy.live_path().display(),
            level = %config.level,
            provider = logger.sync.kind(),
            "logger initialized"
        );
        logger.state.lock().policy = Some(policy);
        Ok(logger)
    }

    /// Builds an event and delivers it to every eligible sink.
    ///
    /// Events below [`level`](Self::level) are dropped without locking and
    /// yield an empty report.
    ///
    /// # Errors
    ///
    /// [`LoggerError::ShutDown`] after [`shutdown`](Self::shutdown), or
    /// [`LoggerError::Sync`] when the provider cannot be acquired. Sink
    /// failures are counted in the report, not returned.
    pub fn submit(
        &self,
        level: LogLevel,
        file: &str,
        line: u32,
        args: fmt::Arguments<'_>,
    ) -> Result<DispatchReport> {
        self.ensure_running()?;
        if level < self.level() {
            return Ok(DispatchReport::default());
        }

        let _guard = SyncGuard::acquire(self.sync.as_ref())?;
        let mut state = self.state.lock();
        self.ensure_running()?;

        let event = LogEvent::new(level, file, line, args);
        Ok(dispatch(&mut state.registry, &event))
    }

    /// Submits an event, reporting a failure on the diagnostic channel
    /// instead of returning it. Used by the level macros.
    pub fn log(&self, level: LogLevel, file: &str, line: u32, args: fmt::Arguments<'_>) {
        if let Err(err) = self.submit(level, file, line, args) {
            debug!(%err, %level, "log event discarded");
        }
    }

    /// Adds a sink that receives events at `min_level` and above.
    ///
    /// # Errors
    ///
    /// [`LoggerError::Registry`] for an empty, overlong or duplicate name or
    /// a full registry.
    pub fn register_sink(
        &self,
        name: &str,
        min_level: LogLevel,
        sink: Box<dyn LogSink>,
    ) -> Result<SinkId> {
        self.with_state(|state| Ok(state.registry.register(name, min_level, sink)?))
    }

    /// Removes a sink, flushing it before it is dropped.
    pub fn remove_sink(&self, id: SinkId) -> Result<()> {
        let entry = self.with_state(|state| Ok(state.registry.remove(id)?))?;
        let name = entry.name().to_string();
        let mut sink = entry.into_sink();
        if let Err(err) = sink.flush() {
            warn!(sink = name.as_str(), %id, %err, "flush of removed sink failed");
        }
        Ok(())
    }

    pub fn find_sink(&self, name: &str) -> Result<SinkInfo> {
        self.with_state(|state| Ok(state.registry.find_by_name(name)?.info()))
    }

    /// Live sinks in registration order.
    pub fn sinks(&self) -> Result<Vec<SinkInfo>> {
        self.with_state(|state| Ok(state.registry.iter().map(|e| e.info()).collect()))
    }

    pub fn set_sink_level(&self, id: SinkId, min_level: LogLevel) -> Result<()> {
        self.with_state(|state| Ok(state.registry.set_min_level(id, min_level)?))
    }

    /// Sets the logger-wide threshold checked before locking.
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_u8(), Ordering::Relaxed);
    }

    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::try_from(self.level.load(Ordering::Relaxed)).unwrap_or(LogLevel::Trace)
    }

    /// Policy of the file sink installed by [`init`](Self::init), if any.
    pub fn rotation_policy(&self) -> Option<RotationPolicy> {
        self.state.lock().policy.clone()
    }

    /// Flushes every sink. Failures are reported on the diagnostic channel.
    pub fn flush(&self) -> Result<()> {
        self.with_state(|state| {
            state.registry.for_each_live_mut(|entry| {
                let id = entry.id();
                let (name, sink) = entry.parts_mut();
                if let Err(err) = sink.flush() {
                    warn!(sink = name, %id, %err, "sink flush failed");
                }
            });
            Ok(())
        })
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Flushes and drops every sink and detaches from the provider.
    ///
    /// Later calls are no-ops; later submissions fail with
    /// [`LoggerError::ShutDown`].
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        let guard = match SyncGuard::acquire(self.sync.as_ref()) {
            Ok(guard) => Some(guard),
            Err(err) => {
                warn!(%err, "shutting down without the logger lock");
                None
            }
        };
        let entries = self.state.lock().registry.drain();
        for entry in entries {
            let id = entry.id();
            let name = entry.name().to_string();
            let mut sink = entry.into_sink();
            if let Err(err) = sink.flush() {
                warn!(sink = name.as_str(), %id, %err, "sink flush failed during shutdown");
            }
        }
        drop(guard);

        self.sync.close();
        debug!(provider = self.sync.kind(), "logger shut down");
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(LoggerError::ShutDown);
        }
        Ok(())
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut LoggerState) -> Result<T>) -> Result<T> {
        self.ensure_running()?;
        let _guard = SyncGuard::acquire(self.sync.as_ref())?;
        let mut state = self.state.lock();
        self.ensure_running()?;
        f(&mut state)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("provider", &self.sync.kind())
            .field("level", &self.level())
            .field("shut_down", &self.is_shut_down())
            .finish_non_exhaustive()
    }
}
