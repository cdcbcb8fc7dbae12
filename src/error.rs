use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while validating the logger configuration.
///
/// Returned synchronously from initialization; nothing is left usable when
/// one of these comes back.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("error reading config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("base name pattern is missing")]
    MissingNamePattern,

    #[error("base name pattern is {len} bytes, at most {max} allowed")]
    NamePatternTooLong { len: usize, max: usize },

    #[error("base name pattern {0:?} must not contain path separators")]
    InvalidNamePattern(String),

    #[error("output directory is {len} bytes, at most {max} allowed")]
    OutputPathTooLong { len: usize, max: usize },

    #[error("output directory {} does not exist or is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("max file size must be greater than zero")]
    ZeroMaxFileSize,

    #[error("sink capacity {capacity} cannot hold the {required} default sinks")]
    CapacityTooSmall { capacity: usize, required: usize },

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Errors returned by sink registration and removal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("sink name must not be empty")]
    InvalidName,

    #[error("sink name {name:?} is longer than {max} bytes")]
    NameTooLong { name: String, max: usize },

    #[error("a sink named {0:?} is already registered")]
    DuplicateName(String),

    #[error("sink registry is full ({0} slots)")]
    CapacityExceeded(usize),

    #[error("no such sink")]
    NotFound,
}

/// Errors raised by a synchronization provider.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid shared lock name {0:?}")]
    InvalidName(String),

    #[cfg(unix)]
    #[error("cannot open shared memory segment {name}: {source}")]
    Open {
        name: String,
        #[source]
        source: nix::Error,
    },

    #[error("cannot size shared memory segment {name}: {source}")]
    Resize {
        name: String,
        #[source]
        source: io::Error,
    },

    #[cfg(unix)]
    #[error("cannot map shared memory segment {name}: {source}")]
    Map {
        name: String,
        #[source]
        source: nix::Error,
    },

    #[error("shared memory segment {0} was never initialized by its creator")]
    AttachTimeout(String),

    #[error("pthread mutex call {call} failed with code {code}")]
    Mutex { call: &'static str, code: i32 },

    #[error("shared memory locks are not supported on this platform")]
    Unsupported,
}

/// A failed step of a file rotation. Reported, never fatal.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("cannot remove {}: {source}", path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot reopen {}: {source}", path.display())]
    Reopen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot truncate {}: {source}", path.display())]
    Truncate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Umbrella error for the public logger operations.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("cannot open log file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("logger has been shut down")]
    ShutDown,
}

pub type Result<T, E = LoggerError> = std::result::Result<T, E>;
