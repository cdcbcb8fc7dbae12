//! sinklog is a synchronous logging core with pluggable sinks.
//!
//! Events are filtered by level and delivered, one at a time, to every
//! registered sink under a single lock. That lock is either local to the
//! process or lives in POSIX shared memory so that several processes can
//! append to the same rotating log files without interleaving lines.
//!
//! ```no_run
//! use sinklog::config::LoggerConfig;
//! use sinklog::log::{LogLevel, LoggerHandle};
//!
//! # fn main() -> sinklog::error::Result<()> {
//! let logger = LoggerHandle::init(
//!     &LoggerConfig::new("server")
//!         .output_directory("/var/log/server")
//!         .level(LogLevel::Info),
//! )?;
//! sinklog::logger_info!(logger, "listening on {}", 8080);
//! # Ok(())
//! # }
//! ```

/// Handles configuration loading and validation.
pub mod config;
/// Error types returned by every public operation.
pub mod error;
/// Event model, sink trait, dispatch and the logger.
pub mod log;
/// Named, fixed-capacity table of sinks.
pub mod registry;
/// Size-based rotation of the live log file.
pub mod rotation;
/// Built-in console, writer and file sinks.
pub mod sinks;
/// Locks that serialize dispatch within or across processes.
pub mod sync;
